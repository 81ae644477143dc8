//! This example shows how to compose a map image around a fixed location and
//! save it to a file.
//!
//! Running it will download the covering tiles from the OSM tile server and
//! create a file `output_map.png` in the current directory.
//!
//! ```shell
//! cargo run --example compose_to_file
//! ```

use anyhow::{anyhow, Result};
use image::{ImageBuffer, Rgba};
use tilemosaic::{latlon, TileCompositorBuilder, Viewport};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let compositor = TileCompositorBuilder::new_osm()
        .with_user_agent("tilemosaic-example/0.1")
        .build()?;

    let viewport = Viewport::new(latlon!(33.4251, -111.9400), 16, 600, 400);
    let composite = compositor.compose(&viewport).await;

    if !composite.failed_tiles().is_empty() {
        log::warn!(
            "{} tiles could not be loaded and are left blank",
            composite.failed_tiles().len()
        );
    }

    let image = composite.into_image();
    let (width, height) = (image.width(), image.height());
    let buffer: ImageBuffer<Rgba<u8>, Vec<u8>> =
        ImageBuffer::from_raw(width, height, image.into_bytes())
            .ok_or_else(|| anyhow!("composite buffer does not match its dimensions"))?;
    buffer.save("output_map.png")?;

    println!("Saved {width}x{height} map to output_map.png");

    Ok(())
}
