use log::debug;
use opencv::core::Mat;
use opencv::prelude::*;

use crate::error::{EncodingError, Result};
use crate::face::{FaceBackend, FaceEncoding, FaceLocation};
use crate::utils;

/// 检测前图片被缩放到的宽度
pub const SIZE: i32 = 500;
/// 人脸缩略图的宽度
pub const HALF_SIZE: i32 = 250;

/// 从一张图片中提取到的人脸
#[derive(Debug)]
pub struct Features {
    pub encoding: FaceEncoding,
    pub location: FaceLocation,
    pub thumbnail: Mat,
}

pub struct FeatureExtractor<B> {
    backend: B,
}

impl<B: FaceBackend> FeatureExtractor<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// 解码并缩放到统一宽度
    pub fn normalize(&self, data: &[u8]) -> Result<Mat> {
        let image = utils::imdecode(data)?;
        debug!("原始尺寸: {}x{}", image.cols(), image.rows());
        utils::resize_to_width(&image, SIZE)
    }

    /// 图片中必须恰好有一张人脸，否则返回 [`EncodingError`]
    pub fn extract(&mut self, data: &[u8]) -> Result<Features> {
        let image = self.normalize(data)?;
        let mut faces = self.backend.detect_faces(&image)?;
        debug!("检测到 {} 张人脸", faces.len());
        if faces.len() != 1 {
            return Err(EncodingError::face_count(faces.len()).into());
        }
        let face = faces.remove(0);

        let crop = utils::crop(&image, face.location.to_rect())?;
        let thumbnail = utils::resize_to_width(&crop, HALF_SIZE)?;
        Ok(Features { encoding: face.encoding, location: face.location, thumbnail })
    }
}
