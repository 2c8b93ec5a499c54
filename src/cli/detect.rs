use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::{info, warn};
use opencv::core::{Mat, Scalar};
use opencv::imgproc;

use crate::cli::SubCommandExtend;
use crate::config::{FaceOptions, Opts, OutputFormat};
use crate::face::{DetectedFace, FaceBackend, SFaceBackend};
use crate::features::FeatureExtractor;
use crate::utils;

#[derive(Parser, Debug, Clone)]
pub struct DetectCommand {
    #[command(flatten)]
    pub face: FaceOptions,
    /// 图片路径
    pub image: PathBuf,
    /// 不使用 GUI 展示，而是保存到文件
    pub output: Option<PathBuf>,
    /// 输出格式
    #[arg(long, value_enum, value_name = "FORMAT", default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

impl SubCommandExtend for DetectCommand {
    fn run(&self, _opts: &Opts) -> Result<()> {
        let data = utils::read_image_bytes(&self.image)?;
        let mut extractor = FeatureExtractor::new(SFaceBackend::create(&self.face)?);
        let (mut image, faces) =
            detect(&mut extractor, &data).map_err(|e| e.in_file(&self.image))?;
        info!("{} 中检测到 {} 张人脸", self.image.display(), faces.len());

        print_faces(&faces, self.format)?;
        draw_faces(&mut image, &faces)?;

        match &self.output {
            Some(file) => utils::write_bytes(file, &utils::imencode_png(&image)?)?,
            None => {
                if let Err(e) = utils::imshow("faces", &image) {
                    warn!("无法显示图片: {e}");
                }
            }
        }
        Ok(())
    }
}

/// 与对比时相同的预处理，返回缩放后的图片和其中的全部人脸
pub fn detect<B: FaceBackend>(
    extractor: &mut FeatureExtractor<B>,
    data: &[u8],
) -> crate::Result<(Mat, Vec<DetectedFace>)> {
    let image = extractor.normalize(data)?;
    let faces = extractor.backend_mut().detect_faces(&image)?;
    Ok((image, faces))
}

/// 只有一张人脸时用绿色框，否则用红色框
pub fn draw_faces(image: &mut Mat, faces: &[DetectedFace]) -> crate::Result<()> {
    let color = if faces.len() == 1 {
        Scalar::new(0., 255., 0., 0.)
    } else {
        Scalar::new(0., 0., 255., 0.)
    };
    for face in faces {
        imgproc::rectangle(image, face.location.to_rect(), color, 2, imgproc::LINE_8, 0)?;
    }
    Ok(())
}

fn print_faces(faces: &[DetectedFace], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let locations: Vec<_> = faces.iter().map(|f| (f.score, f.location)).collect();
            println!("{}", serde_json::to_string_pretty(&locations)?)
        }
        OutputFormat::Table => {
            for face in faces {
                let loc = face.location;
                println!(
                    "{:.3}\t{}\t{}\t{}\t{}",
                    face.score, loc.top, loc.right, loc.bottom, loc.left
                );
            }
        }
    }
    Ok(())
}
