//! Documentation thumbnails for color LUTs.
//!
//! Every `.cube` file under `<lut-root>/<category>/` is applied to one source
//! image. The result is scaled down, framed with a white border and saved as
//! `<category>_<name>.jpg`.

pub mod gallery;
pub mod lut;

pub use gallery::{GalleryCategory, render_gallery};
pub use lut::CubeLut;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{ImageEncoder, Rgb, RgbImage};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::error::LibraryError;

pub const THUMBNAIL_SCALE: f32 = 0.35;
pub const BORDER_SIZE: u32 = 5;
pub const JPEG_QUALITY: u8 = 90;

#[derive(Debug, Clone, PartialEq)]
pub struct LutJob {
    pub category: String,
    pub cube_path: PathBuf,
    pub output_name: String,
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, LibraryError> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort();
    Ok(entries)
}

/// Category folders in name order, each with its `.cube` files in name order.
pub fn collect_jobs(lut_root: &Path) -> Result<Vec<(String, Vec<LutJob>)>, LibraryError> {
    let mut categories = Vec::new();
    for folder in sorted_entries(lut_root)? {
        if !folder.is_dir() {
            continue;
        }
        let Some(category) = folder.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };

        let mut jobs = Vec::new();
        for cube_path in sorted_entries(&folder)? {
            let is_cube = cube_path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("cube"));
            if !is_cube {
                continue;
            }
            let Some(stem) = cube_path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            jobs.push(LutJob {
                output_name: format!("{}_{}.jpg", category, stem),
                category: category.clone(),
                cube_path,
            });
        }
        categories.push((category, jobs));
    }
    Ok(categories)
}

/// Surrounds `image` with a solid frame `size` pixels wide.
pub fn add_border(image: &RgbImage, size: u32, color: Rgb<u8>) -> RgbImage {
    let mut framed = RgbImage::from_pixel(image.width() + 2 * size, image.height() + 2 * size, color);
    imageops::replace(&mut framed, image, size as i64, size as i64);
    framed
}

pub fn render_thumbnail(source: &RgbImage, lut: &CubeLut) -> RgbImage {
    let mut graded = source.clone();
    lut.apply(&mut graded);
    let width = ((graded.width() as f32 * THUMBNAIL_SCALE).round() as u32).max(1);
    let height = ((graded.height() as f32 * THUMBNAIL_SCALE).round() as u32).max(1);
    let scaled = imageops::resize(&graded, width, height, FilterType::Triangle);
    add_border(&scaled, BORDER_SIZE, Rgb([255, 255, 255]))
}

pub fn write_jpeg(image: &RgbImage, path: &Path) -> Result<(), LibraryError> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(writer, JPEG_QUALITY);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgb8,
    )?;
    Ok(())
}

fn process(source: &RgbImage, job: &LutJob, output_dir: &Path) -> Result<(), LibraryError> {
    let lut = CubeLut::load(&job.cube_path)?;
    debug!(
        "Applying {} ({}x{}x{})",
        lut.title().unwrap_or(&job.output_name),
        lut.size(),
        lut.size(),
        lut.size()
    );
    let thumbnail = render_thumbnail(source, &lut);
    write_jpeg(&thumbnail, &output_dir.join(&job.output_name))
}

/// Renders one thumbnail per LUT, in parallel, and returns the gallery of
/// the thumbnails that were written.
pub fn generate(
    source: &Path,
    lut_root: &Path,
    output_dir: &Path,
) -> Result<Vec<GalleryCategory>, LibraryError> {
    fs::create_dir_all(output_dir)?;
    let source = image::open(source)?.to_rgb8();
    let categories = collect_jobs(lut_root)?;

    let gallery = categories
        .into_iter()
        .map(|(category, jobs)| {
            let written: Vec<Option<String>> = jobs
                .par_iter()
                .map(|job| match process(&source, job, output_dir) {
                    Ok(()) => {
                        info!("Wrote {}", job.output_name);
                        Some(job.output_name.clone())
                    }
                    Err(err) => {
                        warn!("Skipping {}: {}", job.cube_path.display(), err);
                        None
                    }
                })
                .collect();
            GalleryCategory {
                category,
                images: written.into_iter().flatten().collect(),
            }
        })
        .collect();
    Ok(gallery)
}
