use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::image::Image,
};

/// Reduces a client-supplied filename to a safe single path component.
///
/// Directory parts are dropped and every character outside
/// `[A-Za-z0-9._-]` becomes `_`. Names that are empty or start with a dot
/// are rejected.
pub fn sanitize_filename(raw: &str) -> Result<String> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    let name: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if name.is_empty() || name.starts_with('.') {
        return Err(AppError::InvalidFilename);
    }
    Ok(name)
}

/// How many leading bytes are collected before sniffing the content type.
const SNIFF_LEN: usize = 64;

/// Reads up to [`SNIFF_LEN`] bytes, however the source happens to chunk them.
async fn read_head<R>(src: &mut R) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut head = vec![0u8; SNIFF_LEN];
    let mut filled = 0;
    while filled < SNIFF_LEN {
        let n = src.read(&mut head[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    head.truncate(filled);
    Ok(head)
}

/// Stores images as files under `{root}/galleries/{gallery_id}/`.
#[derive(Clone, Debug)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn gallery_dir(&self, gallery_id: i64) -> PathBuf {
        self.root.join("galleries").join(gallery_id.to_string())
    }

    /// Streams `src` into the gallery's directory under `filename`.
    ///
    /// The bytes land in a hidden temporary file first and are renamed into
    /// place once complete. An existing image with the same name is
    /// replaced.
    ///
    /// # Arguments
    ///
    /// * `gallery_id` - The gallery the image belongs to.
    /// * `filename` - The client-supplied name, sanitized before use.
    /// * `src` - The image bytes.
    ///
    /// # Returns
    ///
    /// A `Result` containing the stored image, `InvalidFilename` or
    /// `NotAnImage`.
    pub async fn create<R>(&self, gallery_id: i64, filename: &str, mut src: R) -> Result<Image>
    where
        R: AsyncRead + Unpin,
    {
        let filename = sanitize_filename(filename)?;

        let head = read_head(&mut src).await?;
        if !infer::is_image(&head) {
            tracing::debug!("Rejected non-image upload: {}", filename);
            return Err(AppError::NotAnImage);
        }
        let mut reader = BufReader::with_capacity(64 * 1024, Cursor::new(head).chain(src));

        let dir = self.gallery_dir(gallery_id);
        fs::create_dir_all(&dir).await?;

        let part_path = dir.join(format!(".{}.part", Uuid::new_v4()));
        let written = match write_file(&part_path, &mut reader).await {
            Ok(n) => n,
            Err(e) => {
                let _ = fs::remove_file(&part_path).await;
                return Err(e);
            }
        };
        fs::rename(&part_path, dir.join(&filename)).await?;

        tracing::info!(
            "📸 Stored image {} in gallery {} ({} bytes)",
            filename,
            gallery_id,
            written
        );
        Ok(Image::new(gallery_id, filename))
    }

    /// Lists a gallery's images sorted by filename. A gallery without a
    /// directory has no images.
    pub async fn by_gallery_id(&self, gallery_id: i64) -> Result<Vec<Image>> {
        let mut entries = match fs::read_dir(self.gallery_dir(gallery_id)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut images = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let Ok(filename) = entry.file_name().into_string() else {
                continue;
            };
            if filename.starts_with('.') {
                continue;
            }
            images.push(Image::new(gallery_id, filename));
        }
        images.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(images)
    }

    /// Removes a single image.
    pub async fn delete(&self, image: &Image) -> Result<()> {
        let filename = sanitize_filename(&image.filename)?;
        match fs::remove_file(self.gallery_dir(image.gallery_id).join(&filename)).await {
            Ok(()) => {
                tracing::info!("🗑️ Deleted image {} from gallery {}", filename, image.gallery_id);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(AppError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes a gallery's whole image directory.
    pub async fn delete_gallery(&self, gallery_id: i64) -> Result<()> {
        match fs::remove_dir_all(self.gallery_dir(gallery_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

async fn write_file<R>(path: &Path, reader: &mut BufReader<R>) -> Result<u64>
where
    R: AsyncRead + Unpin,
{
    let mut file = fs::File::create(path).await?;
    let written = tokio::io::copy_buf(reader, &mut file).await?;
    file.flush().await?;
    Ok(written)
}
