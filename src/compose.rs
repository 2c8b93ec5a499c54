use opencv::core::{self, Mat, Point, Scalar, Size};
use opencv::imgproc;
use opencv::prelude::*;

use crate::error::Result;
use crate::matcher::MatchResult;
use crate::utils;

pub type Rgb = (u8, u8, u8);

pub const GREEN: Rgb = (0, 255, 0);
pub const RED: Rgb = (255, 0, 0);

/// 文字到左上角的距离
const TEXT_INSET: i32 = 10;
const FONT_FACE: i32 = imgproc::FONT_HERSHEY_SIMPLEX;
const FONT_SCALE: f64 = 0.5;
const FONT_THICKNESS: i32 = 1;

/// OpenCV 的通道顺序为 BGR
fn to_scalar((r, g, b): Rgb) -> Scalar {
    Scalar::new(b as f64, g as f64, r as f64, 0.)
}

pub fn text_color(is_match: bool) -> Rgb {
    if is_match { GREEN } else { RED }
}

/// 左右拼接两张图片，高度取两者较大值，空白处填充黑色
pub fn concat_h_blank(im1: &Mat, im2: &Mat) -> Result<Mat> {
    let height = im1.rows().max(im2.rows());
    let left = pad_bottom(im1, height)?;
    let right = pad_bottom(im2, height)?;
    let mut dst = Mat::default();
    core::hconcat2(&left, &right, &mut dst)?;
    Ok(dst)
}

fn pad_bottom(img: &Mat, height: i32) -> Result<Mat> {
    let mut out = Mat::default();
    core::copy_make_border(
        img,
        &mut out,
        0,
        height - img.rows(),
        0,
        0,
        core::BORDER_CONSTANT,
        Scalar::all(0.),
    )?;
    Ok(out)
}

/// 右下角写距离，左上角写匹配百分比
pub fn annotate(img: &mut Mat, result: &MatchResult) -> Result<()> {
    let color = to_scalar(text_color(result.is_match));

    let distance = format!("Distance: {:.2}", result.distance);
    let mut baseline = 0;
    let size =
        imgproc::get_text_size(&distance, FONT_FACE, FONT_SCALE, FONT_THICKNESS, &mut baseline)?;
    let org = bottom_right_origin(img.size()?, size, baseline);
    put_text(img, &distance, org, color)?;

    let percentage = format!("Matching Percentage: {:.2}%", result.matching_percentage);
    let size =
        imgproc::get_text_size(&percentage, FONT_FACE, FONT_SCALE, FONT_THICKNESS, &mut baseline)?;
    put_text(img, &percentage, Point::new(TEXT_INSET, TEXT_INSET + size.height), color)?;
    Ok(())
}

/// 文字右边缘贴住画布右边缘，下伸部分贴住画布底边
fn bottom_right_origin(canvas: Size, text: Size, baseline: i32) -> Point {
    Point::new(canvas.width - text.width, canvas.height - baseline)
}

fn put_text(img: &mut Mat, text: &str, org: Point, color: Scalar) -> Result<()> {
    imgproc::put_text(
        img,
        text,
        org,
        FONT_FACE,
        FONT_SCALE,
        color,
        FONT_THICKNESS,
        imgproc::LINE_AA,
        false,
    )?;
    Ok(())
}

pub fn render(im1: &Mat, im2: &Mat, result: &MatchResult) -> Result<Mat> {
    let mut out = concat_h_blank(im1, im2)?;
    annotate(&mut out, result)?;
    Ok(out)
}

pub fn render_png(im1: &Mat, im2: &Mat, result: &MatchResult) -> Result<Vec<u8>> {
    utils::imencode_png(&render(im1, im2, result)?)
}
