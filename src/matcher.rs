use serde::Serialize;

use crate::config::DEFAULT_THRESHOLD;
use crate::error::{Error, Result};
use crate::face::FaceEncoding;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchResult {
    pub distance: f64,
    pub matching_percentage: f64,
    pub is_match: bool,
}

impl MatchResult {
    /// 百分比可能为负数（距离大于 1 时），不做截断
    pub fn from_distance(distance: f64, threshold: f64) -> Self {
        Self {
            distance,
            matching_percentage: (1. - distance) * 100.,
            is_match: distance <= threshold,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Matcher {
    threshold: f64,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl Matcher {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn compare(&self, a: &FaceEncoding, b: &FaceEncoding) -> Result<MatchResult> {
        Ok(MatchResult::from_distance(face_distance(a, b)?, self.threshold))
    }
}

/// 两个特征向量的欧氏距离
pub fn face_distance(a: &FaceEncoding, b: &FaceEncoding) -> Result<f64> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch(a.len(), b.len()));
    }
    let diff = (a.as_array() - b.as_array()).mapv(f64::from);
    Ok(diff.dot(&diff).sqrt())
}
