//! reStructuredText gallery of generated thumbnails.

use std::fmt::Write;

/// Thumbnails generated for one LUT folder.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryCategory {
    pub category: String,
    pub images: Vec<String>,
}

/// `black_and_white` -> `Black And White`
pub fn category_title(category: &str) -> String {
    let mut title = String::with_capacity(category.len());
    let mut previous_is_letter = false;
    for ch in category.replace('_', " ").chars() {
        if ch.is_alphabetic() {
            if previous_is_letter {
                title.extend(ch.to_lowercase());
            } else {
                title.extend(ch.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            title.push(ch);
            previous_is_letter = false;
        }
    }
    title
}

pub fn render_gallery(categories: &[GalleryCategory]) -> String {
    let mut out = String::new();
    for category in categories {
        let title = category_title(&category.category);
        let _ = writeln!(out, "{}", title);
        let _ = writeln!(out, "{}", "^".repeat(title.chars().count()));
        let _ = writeln!(out);
        let _ = writeln!(out, ".. container:: gallery");
        let _ = writeln!(out);
        for image in &category.images {
            let _ = writeln!(out, "   .. image:: images/colors/{}", image);
            let _ = writeln!(out, "      :width: 30%");
            let _ = writeln!(out);
        }
        let _ = writeln!(out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_follow_word_boundaries() {
        assert_eq!(category_title("black_and_white"), "Black And White");
        assert_eq!(category_title("FILM-looks"), "Film-Looks");
    }

    #[test]
    fn gallery_lists_images_per_category() {
        let rst = render_gallery(&[GalleryCategory {
            category: "warm".into(),
            images: vec!["warm_sunset.jpg".into()],
        }]);
        assert!(rst.starts_with("Warm\n^^^^\n\n.. container:: gallery\n\n"));
        assert!(rst.contains("   .. image:: images/colors/warm_sunset.jpg\n      :width: 30%\n"));
    }
}
