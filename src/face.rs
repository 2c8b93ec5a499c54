use log::debug;
use ndarray::Array1;
use opencv::core::{Mat, Ptr, Rect, Size};
use opencv::objdetect::{FaceDetectorYN, FaceRecognizerSF};
use opencv::prelude::*;
use serde::Serialize;

use crate::config::{DEFAULT_THRESHOLD, FaceOptions};
use crate::error::{Error, Result};

/// YuNet 输出的每一行为 15 个浮点数：x, y, w, h, 5 个关键点坐标, 置信度
const YUNET_SCORE_COLUMN: i32 = 14;

/// SFace 在单位特征向量上的 L2 判定阈值（OpenCV FR_NORM_L2）
pub const SFACE_L2_THRESHOLD: f64 = 1.128;

/// 特征向量归一化后的长度。
///
/// 距离与向量长度成正比，缩放到这个长度后，SFace 的阈值 1.128 正好落在 0.6 上，
/// 和 dlib 特征的欧氏距离处于同一刻度。
pub const ENCODING_NORM: f64 = DEFAULT_THRESHOLD / SFACE_L2_THRESHOLD;

/// 一张人脸的特征向量，长度由识别模型决定（SFace 为 128）
#[derive(Debug, Clone, PartialEq)]
pub struct FaceEncoding(Array1<f32>);

impl FaceEncoding {
    pub fn new(values: Vec<f32>) -> Self {
        Self(Array1::from(values))
    }

    /// 识别模型输出的原始特征没有归一化，这里统一缩放到 [`ENCODING_NORM`]
    fn from_mat(feature: &Mat) -> Result<Self> {
        let raw = Array1::from(feature.data_typed::<f32>()?.to_vec());
        let norm = raw.dot(&raw).sqrt();
        if norm > 0. {
            Ok(Self(raw * (ENCODING_NORM as f32 / norm)))
        } else {
            Ok(Self(raw))
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_array(&self) -> &Array1<f32> {
        &self.0
    }
}

/// 人脸框，坐标基于缩放后的图片，right 与 bottom 不包含在内
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FaceLocation {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl FaceLocation {
    /// 由检测器输出的 (x, y, w, h) 构造，裁剪到图片范围内。
    ///
    /// 检测器偶尔会给出完全落在图片外面的框，这种情况返回 None。
    pub fn from_xywh(x: f32, y: f32, w: f32, h: f32, cols: i32, rows: i32) -> Option<Self> {
        let left = (x.round() as i32).clamp(0, cols);
        let top = (y.round() as i32).clamp(0, rows);
        let right = ((x + w).round() as i32).clamp(0, cols);
        let bottom = ((y + h).round() as i32).clamp(0, rows);
        (left < right && top < bottom).then_some(Self { top, right, bottom, left })
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.width(), self.height())
    }
}

/// 一次检测中得到的人脸，位置和特征来自同一个检测结果
#[derive(Debug, Clone)]
pub struct DetectedFace {
    pub location: FaceLocation,
    pub encoding: FaceEncoding,
    pub score: f32,
}

/// 人脸检测与特征提取的后端
pub trait FaceBackend {
    /// 返回图片中所有人脸的位置与特征
    fn detect_faces(&mut self, image: &Mat) -> Result<Vec<DetectedFace>>;
}

/// 基于 OpenCV YuNet 检测器与 SFace 识别模型的后端
pub struct SFaceBackend {
    detector: Ptr<FaceDetectorYN>,
    recognizer: Ptr<FaceRecognizerSF>,
}

impl SFaceBackend {
    pub fn create(opts: &FaceOptions) -> Result<Self> {
        for model in [&opts.detector_model, &opts.recognizer_model] {
            if !model.is_file() {
                return Err(Error::ModelNotFound(model.clone()));
            }
        }
        debug!("加载检测模型: {}", opts.detector_model.display());
        let detector = FaceDetectorYN::create(
            &opts.detector_model.to_string_lossy(),
            "",
            Size::new(320, 320),
            opts.score_threshold,
            opts.nms_threshold,
            opts.top_k,
            0,
            0,
        )?;
        debug!("加载识别模型: {}", opts.recognizer_model.display());
        let recognizer =
            FaceRecognizerSF::create(&opts.recognizer_model.to_string_lossy(), "", 0, 0)?;
        Ok(Self { detector, recognizer })
    }
}

impl FaceBackend for SFaceBackend {
    fn detect_faces(&mut self, image: &Mat) -> Result<Vec<DetectedFace>> {
        self.detector.set_input_size(image.size()?)?;
        let mut faces = Mat::default();
        self.detector.detect(image, &mut faces)?;

        let mut detected = Vec::with_capacity(faces.rows().max(0) as usize);
        for i in 0..faces.rows() {
            let (x, y, w, h) = (
                *faces.at_2d::<f32>(i, 0)?,
                *faces.at_2d::<f32>(i, 1)?,
                *faces.at_2d::<f32>(i, 2)?,
                *faces.at_2d::<f32>(i, 3)?,
            );
            let score = *faces.at_2d::<f32>(i, YUNET_SCORE_COLUMN)?;
            let Some(location) = FaceLocation::from_xywh(x, y, w, h, image.cols(), image.rows())
            else {
                debug!("检测到无效的人脸框 ({x}, {y}, {w}, {h})，已丢弃");
                continue;
            };

            let face_box = faces.row(i)?.try_clone()?;
            let mut aligned = Mat::default();
            self.recognizer.align_crop(image, &face_box, &mut aligned)?;
            let mut feature = Mat::default();
            self.recognizer.feature(&aligned, &mut feature)?;

            let encoding = FaceEncoding::from_mat(&feature)?;
            detected.push(DetectedFace { location, encoding, score });
        }
        Ok(detected)
    }
}
