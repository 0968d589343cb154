use std::path::PathBuf;

use properties_core::thumbnails::{generate, render_gallery};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let [_, source, lut_root, output_dir] = args.as_slice() else {
        anyhow::bail!("usage: lut-thumbnails <source-image> <lut-folder> <output-folder>");
    };

    let gallery = generate(
        &PathBuf::from(source),
        &PathBuf::from(lut_root),
        &PathBuf::from(output_dir),
    )?;
    print!("{}", render_gallery(&gallery));
    Ok(())
}
