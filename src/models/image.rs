use std::path::PathBuf;

/// An image stored on the local filesystem.
///
/// Images have no database row; the file under the gallery's directory is the
/// record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    /// The ID of the gallery the image belongs to.
    pub gallery_id: i64,
    /// The sanitized filename.
    pub filename: String,
}

impl Image {
    pub fn new(gallery_id: i64, filename: impl Into<String>) -> Self {
        Self {
            gallery_id,
            filename: filename.into(),
        }
    }

    /// The path relative to the images root, e.g. `galleries/4/cat.png`.
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from("galleries")
            .join(self.gallery_id.to_string())
            .join(&self.filename)
    }

    /// The public URL the image is served under.
    pub fn url(&self) -> String {
        format!("/images/galleries/{}/{}", self.gallery_id, self.filename)
    }

    /// The form action that deletes this image.
    pub fn delete_url(&self) -> String {
        format!("/galleries/{}/images/{}/delete", self.gallery_id, self.filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_namespaced_by_gallery() {
        let image = Image::new(7, "cat.png");
        assert_eq!(image.relative_path(), PathBuf::from("galleries/7/cat.png"));
        assert_eq!(image.url(), "/images/galleries/7/cat.png");
        assert_eq!(image.delete_url(), "/galleries/7/images/cat.png/delete");
    }
}
