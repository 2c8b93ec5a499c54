use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// 输入的两张图片的序号，用于区分是哪一张图片出了问题
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    First,
    Second,
}

impl fmt::Display for ImageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => f.write_str("first"),
            Self::Second => f.write_str("second"),
        }
    }
}

/// 图片中的人脸数量不是恰好一张
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct EncodingError {
    message: String,
    faces: usize,
}

impl EncodingError {
    pub fn face_count(faces: usize) -> Self {
        Self { message: "The image must contain only one face".to_string(), faces }
    }

    /// 改写错误信息，指明是第几张图片
    pub fn in_slot(self, slot: ImageSlot) -> Self {
        Self { message: format!("The {slot} image must contain only one face"), ..self }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// 实际检测到的人脸数量
    pub fn faces(&self) -> usize {
        self.faces
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("image data could not be decoded")]
    Decode,
    #[error("image could not be decoded: {}", .0.display())]
    DecodeFile(PathBuf),
    #[error("image could not be encoded as {0}")]
    Encode(&'static str),
    #[error("model file not found: {}", .0.display())]
    ModelNotFound(PathBuf),
    #[error("face encodings have different dimensions: {0} vs {1}")]
    DimensionMismatch(usize, usize),
    #[error("face detection library failed: {0}")]
    OpenCv(#[from] opencv::Error),
}

impl Error {
    /// 仅对人脸数量错误生效，其余错误原样返回
    pub fn in_slot(self, slot: ImageSlot) -> Self {
        match self {
            Self::Encoding(e) => Self::Encoding(e.in_slot(slot)),
            other => other,
        }
    }

    /// 为解码错误补上图片路径，其余错误原样返回
    pub fn in_file(self, path: &Path) -> Self {
        match self {
            Self::Decode => Self::DecodeFile(path.to_path_buf()),
            other => other,
        }
    }

    pub fn is_encoding(&self) -> bool {
        matches!(self, Self::Encoding(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_error_message() {
        let err = EncodingError::face_count(2);
        assert_eq!(err.to_string(), "The image must contain only one face");
        assert_eq!(err.faces(), 2);
    }

    #[test]
    fn encoding_error_in_slot() {
        let err = Error::from(EncodingError::face_count(0)).in_slot(ImageSlot::Second);
        assert!(err.is_encoding());
        assert_eq!(err.to_string(), "The second image must contain only one face");

        let err = EncodingError::face_count(3).in_slot(ImageSlot::First);
        assert_eq!(err.message(), "The first image must contain only one face");
        assert_eq!(err.faces(), 3);
    }

    #[test]
    fn other_errors_keep_message() {
        let err = Error::FileNotFound(PathBuf::from("a.jpg")).in_slot(ImageSlot::First);
        assert!(!err.is_encoding());
        assert_eq!(err.to_string(), "file not found: a.jpg");
    }

    #[test]
    fn decode_error_names_file() {
        let err = Error::Decode.in_file(Path::new("photos/b.png"));
        assert!(matches!(&err, Error::DecodeFile(p) if p == Path::new("photos/b.png")));
        assert_eq!(err.to_string(), "image could not be decoded: photos/b.png");

        let err = Error::from(EncodingError::face_count(2)).in_file(Path::new("a.jpg"));
        assert!(err.is_encoding());
    }
}
