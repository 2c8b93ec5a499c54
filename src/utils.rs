use std::fs;
use std::io::{BufRead, ErrorKind, Write};
use std::path::Path;

use opencv::core::{self, Mat, Rect, Size, Vector};
use opencv::imgproc::InterpolationFlags;
use opencv::prelude::*;
use opencv::{highgui, imgcodecs, imgproc};

use crate::error::{Error, Result};

/// 读取整个文件
pub fn read_image_bytes(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::FileNotFound(path.to_path_buf()),
        _ => Error::Io { path: path.to_path_buf(), source: e },
    })
}

/// 写入文件，已存在的文件会被直接覆盖
pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).map_err(|e| Error::Io { path: path.to_path_buf(), source: e })
}

/// 将编码后的图片解码为 3 通道彩色图像
pub fn imdecode(data: &[u8]) -> Result<Mat> {
    if data.is_empty() {
        return Err(Error::Decode);
    }
    let buf = Vector::<u8>::from_slice(data);
    let img = imgcodecs::imdecode(&buf, imgcodecs::IMREAD_COLOR)?;
    if img.empty() {
        return Err(Error::Decode);
    }
    Ok(img)
}

pub fn imencode_png(img: &impl core::ToInputArray) -> Result<Vec<u8>> {
    let mut buf = Vector::<u8>::new();
    if !imgcodecs::imencode(".png", img, &mut buf, &Vector::new())? {
        return Err(Error::Encode("png"));
    }
    Ok(buf.to_vec())
}

/// 等比缩放到指定宽度，高度向下取整
pub fn resize_to_width(img: &Mat, width: i32) -> Result<Mat> {
    let (ow, oh) = (img.cols() as f64, img.rows() as f64);
    let height = ((width as f64 * (oh / ow)) as i32).max(1);
    let mut output = Mat::default();
    imgproc::resize(
        img,
        &mut output,
        Size::new(width, height),
        0.,
        0.,
        InterpolationFlags::INTER_LANCZOS4 as i32,
    )?;
    Ok(output)
}

/// 复制出图像的一块矩形区域
pub fn crop(img: &Mat, rect: Rect) -> Result<Mat> {
    Ok(Mat::roi(img, rect)?.try_clone()?)
}

/// 打开窗口显示图片，直到窗口被关闭
pub fn imshow(winname: &str, mat: &impl core::ToInputArray) -> opencv::Result<()> {
    highgui::imshow(winname, mat)?;
    while highgui::get_window_property(
        winname,
        highgui::WindowPropertyFlags::WND_PROP_VISIBLE as i32,
    )? >= 1.0
    {
        highgui::wait_key(50)?;
    }
    Ok(())
}

pub fn read_line(prompt: &str) -> anyhow::Result<String> {
    prompt_line(&mut std::io::stdin().lock(), &mut std::io::stdout(), prompt)
}

/// 输出提示并读取一行，去掉首尾空白；输入结束时返回空字符串
pub fn prompt_line(
    input: &mut impl BufRead,
    output: &mut impl Write,
    prompt: &str,
) -> anyhow::Result<String> {
    write!(output, "{prompt}")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_owned())
}

#[cfg(test)]
pub(crate) fn solid_image(width: i32, height: i32, value: f64) -> Mat {
    Mat::new_rows_cols_with_default(height, width, core::CV_8UC3, core::Scalar::all(value))
        .unwrap()
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn prompt_reads_one_line_per_call() {
        let mut input = Cursor::new("  photos/a.jpg \r\nphotos/b.jpg\n".as_bytes());
        let mut output = Vec::new();
        let first = prompt_line(&mut input, &mut output, "first: ").unwrap();
        let second = prompt_line(&mut input, &mut output, "second: ").unwrap();
        assert_eq!(first, "photos/a.jpg");
        assert_eq!(second, "photos/b.jpg");
        assert_eq!(output, b"first: second: ");
        // 输入已结束
        assert_eq!(prompt_line(&mut input, &mut output, "").unwrap(), "");
    }

    #[test]
    fn prompt_rejects_invalid_utf8() {
        let mut input = Cursor::new(&b"\xff\xfe.jpg\n"[..]);
        assert!(prompt_line(&mut input, &mut Vec::new(), "").is_err());
    }

    #[test]
    fn resize_keeps_aspect_ratio() {
        let img = solid_image(600, 400, 128.);
        let out = resize_to_width(&img, 500).unwrap();
        assert_eq!(out.cols(), 500);
        // 500 * 400 / 600 = 333.33，向下取整
        assert_eq!(out.rows(), 333);
    }

    #[test]
    fn resize_never_collapses_height() {
        let img = solid_image(2000, 1, 0.);
        let out = resize_to_width(&img, 250).unwrap();
        assert_eq!((out.cols(), out.rows()), (250, 1));
    }

    #[test]
    fn crop_region() {
        let img = solid_image(100, 80, 10.);
        let out = crop(&img, Rect::new(10, 20, 30, 40)).unwrap();
        assert_eq!((out.cols(), out.rows()), (30, 40));
        assert!(out.is_continuous());
    }

    #[test]
    fn decode_png_bytes() {
        let img = solid_image(32, 24, 200.);
        let png = imencode_png(&img).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        let decoded = imdecode(&png).unwrap();
        assert_eq!((decoded.cols(), decoded.rows(), decoded.channels()), (32, 24, 3));
    }

    #[test]
    fn decode_garbage() {
        assert!(matches!(imdecode(b""), Err(Error::Decode)));
        assert!(matches!(imdecode(b"definitely not an image"), Err(Error::Decode)));
    }

    #[test]
    fn read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.jpg");
        assert!(matches!(read_image_bytes(&path), Err(Error::FileNotFound(p)) if p == path));
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        write_bytes(&path, b"old contents").unwrap();
        write_bytes(&path, b"new").unwrap();
        assert_eq!(read_image_bytes(&path).unwrap(), b"new");
    }
}
