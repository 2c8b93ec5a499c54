use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use crate::cli::SubCommandExtend;
use crate::config::{DEFAULT_OUTPUT, DEFAULT_THRESHOLD, FaceOptions, Opts, OutputFormat};
use crate::error::ImageSlot;
use crate::face::{FaceBackend, SFaceBackend};
use crate::features::{FeatureExtractor, Features};
use crate::matcher::{MatchResult, Matcher};
use crate::{compose, utils};

#[derive(Parser, Debug, Clone)]
pub struct CompareCommand {
    #[command(flatten)]
    pub face: FaceOptions,
    /// 第一张图片，不填则从标准输入读取
    pub image1: Option<PathBuf>,
    /// 第二张图片，不填则从标准输入读取
    pub image2: Option<PathBuf>,
    /// 两张人脸的最大允许距离，不超过该值视为同一个人
    #[arg(short, long, value_name = "DISTANCE", default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,
    /// 对比图的保存路径，已存在的文件会被覆盖
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,
    /// 不使用 GUI 展示对比图
    #[arg(long)]
    pub no_display: bool,
    /// 输出格式
    #[arg(long, value_enum, value_name = "FORMAT", default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

/// 一次对比的全部结果
pub struct Comparison {
    pub first: Features,
    pub second: Features,
    pub result: MatchResult,
    /// PNG 编码后的对比图
    pub image: Vec<u8>,
}

/// 一张输入图片：路径与读入的文件内容
pub type ImageInput<'a> = (&'a Path, &'a [u8]);

impl Comparison {
    /// 依次处理两张图片，任意一张失败都会直接返回，不保留已完成的部分
    pub fn run<B: FaceBackend>(
        extractor: &mut FeatureExtractor<B>,
        matcher: &Matcher,
        first: ImageInput,
        second: ImageInput,
    ) -> crate::Result<Self> {
        let first = extract(extractor, first, ImageSlot::First)?;
        let second = extract(extractor, second, ImageSlot::Second)?;
        let result = matcher.compare(&first.encoding, &second.encoding)?;
        let image = compose::render_png(&first.thumbnail, &second.thumbnail, &result)?;
        Ok(Self { first, second, result, image })
    }
}

fn extract<B: FaceBackend>(
    extractor: &mut FeatureExtractor<B>,
    (path, data): ImageInput,
    slot: ImageSlot,
) -> crate::Result<Features> {
    extractor.extract(data).map_err(|e| e.in_slot(slot).in_file(path))
}

/// 命令行使用的对比流程，失败时附带两张图片的路径
pub fn compare<B: FaceBackend>(
    extractor: &mut FeatureExtractor<B>,
    matcher: &Matcher,
    first: ImageInput,
    second: ImageInput,
) -> Result<Comparison> {
    Comparison::run(extractor, matcher, first, second).with_context(|| {
        format!("failed to compare {} and {}", first.0.display(), second.0.display())
    })
}

impl CompareCommand {
    fn image_path(&self, slot: ImageSlot) -> Result<PathBuf> {
        let given = match slot {
            ImageSlot::First => &self.image1,
            ImageSlot::Second => &self.image2,
        };
        match given {
            Some(path) => Ok(path.clone()),
            None => Ok(utils::read_line(&format!("Enter the file path for the {slot} image: "))?
                .into()),
        }
    }
}

impl SubCommandExtend for CompareCommand {
    fn run(&self, _opts: &Opts) -> Result<()> {
        let path1 = self.image_path(ImageSlot::First)?;
        let path2 = self.image_path(ImageSlot::Second)?;

        // 在开始处理之前先读入两张图片
        let data1 = utils::read_image_bytes(&path1)?;
        let data2 = utils::read_image_bytes(&path2)?;

        let mut extractor = FeatureExtractor::new(SFaceBackend::create(&self.face)?);
        let matcher = Matcher::new(self.threshold);
        let comparison = compare(&mut extractor, &matcher, (&path1, &data1), (&path2, &data2))?;
        info!(
            "人脸位置: {:?} / {:?}，距离: {:.4}",
            comparison.first.location, comparison.second.location, comparison.result.distance
        );

        utils::write_bytes(&self.output, &comparison.image)?;
        info!("对比图已保存到 {}", self.output.display());

        print_result(&comparison.result, self.format)?;

        if !self.no_display {
            let image = utils::imdecode(&comparison.image)?;
            if let Err(e) = utils::imshow("comparison", &image) {
                warn!("无法显示对比图: {e}");
            }
        }
        Ok(())
    }
}

fn print_result(result: &MatchResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result)?)
        }
        OutputFormat::Table => {
            println!("Result: {}", if result.is_match { "Match" } else { "Not a Match" });
            println!("Distance: {}", result.distance);
            println!("Matching Percentage: {} %", result.matching_percentage);
        }
    }
    Ok(())
}
