use std::path::PathBuf;
use std::sync::LazyLock;

use clap::{Parser, Subcommand, ValueEnum};
use directories::ProjectDirs;
use log::LevelFilter;

use crate::cli::*;

pub const DETECTOR_MODEL_FILE: &str = "face_detection_yunet_2023mar.onnx";
pub const RECOGNIZER_MODEL_FILE: &str = "face_recognition_sface_2021dec.onnx";

/// 默认的匹配阈值，距离不超过该值即认为是同一个人
pub const DEFAULT_THRESHOLD: f64 = 0.6;
pub const DEFAULT_OUTPUT: &str = "comparison.png";

static MODEL_DIR: LazyLock<PathBuf> = LazyLock::new(|| {
    ProjectDirs::from("", "facematch", "facematch")
        .map(|dirs| dirs.data_dir().join("models"))
        .unwrap_or_else(|| PathBuf::from("models"))
});

fn default_model(file: &str) -> PathBuf {
    MODEL_DIR.join(file)
}

#[derive(Parser, Debug, Clone)]
pub struct FaceOptions {
    /// YuNet 人脸检测模型路径
    #[arg(long, value_name = "FILE", default_value_os_t = default_model(DETECTOR_MODEL_FILE))]
    pub detector_model: PathBuf,
    /// SFace 人脸识别模型路径
    #[arg(long, value_name = "FILE", default_value_os_t = default_model(RECOGNIZER_MODEL_FILE))]
    pub recognizer_model: PathBuf,
    /// 人脸检测的最低置信度
    #[arg(long, value_name = "SCORE", default_value_t = 0.9)]
    pub score_threshold: f32,
    /// 非极大值抑制的 IoU 阈值
    #[arg(long, value_name = "IOU", default_value_t = 0.3)]
    pub nms_threshold: f32,
    /// 非极大值抑制前保留的候选框数量
    #[arg(long, value_name = "N", default_value_t = 5000)]
    pub top_k: i32,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "facematch", version, args_conflicts_with_subcommands = true)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: Option<SubCommand>,
    #[command(flatten)]
    pub compare: CompareCommand,
    /// 日志级别，可被 RUST_LOG 覆盖
    #[arg(long, global = true, value_name = "LEVEL", default_value_t = LevelFilter::Warn)]
    pub log_level: LevelFilter,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// 检测单张图片中的人脸并标注出来
    Detect(DetectCommand),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Table,
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn compare_defaults() {
        let opts = Opts::try_parse_from(["facematch"]).unwrap();
        assert!(opts.subcmd.is_none());
        assert_eq!(opts.compare.threshold, DEFAULT_THRESHOLD);
        assert_eq!(opts.compare.output, Path::new(DEFAULT_OUTPUT));
        assert_eq!(opts.compare.format, OutputFormat::Table);
        assert!(opts.compare.image1.is_none() && opts.compare.image2.is_none());
        assert!(opts.compare.face.detector_model.ends_with(DETECTOR_MODEL_FILE));
        assert_eq!(opts.log_level, LevelFilter::Warn);
    }

    #[test]
    fn compare_with_paths() {
        let opts = Opts::try_parse_from([
            "facematch",
            "a.jpg",
            "b.jpg",
            "--threshold",
            "0.45",
            "-o",
            "out.png",
            "--no-display",
            "--format",
            "json",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(opts.compare.image1.as_deref(), Some(Path::new("a.jpg")));
        assert_eq!(opts.compare.image2.as_deref(), Some(Path::new("b.jpg")));
        assert_eq!(opts.compare.threshold, 0.45);
        assert_eq!(opts.compare.output, Path::new("out.png"));
        assert!(opts.compare.no_display);
        assert_eq!(opts.compare.format, OutputFormat::Json);
        assert_eq!(opts.log_level, LevelFilter::Debug);
    }

    #[test]
    fn detect_subcommand() {
        let opts = Opts::try_parse_from([
            "facematch",
            "detect",
            "face.jpg",
            "boxes.png",
            "--detector-model",
            "/tmp/yunet.onnx",
        ])
        .unwrap();
        let Some(SubCommand::Detect(cmd)) = opts.subcmd else { panic!("expected detect") };
        assert_eq!(cmd.image, Path::new("face.jpg"));
        assert_eq!(cmd.output.as_deref(), Some(Path::new("boxes.png")));
        assert_eq!(cmd.face.detector_model, Path::new("/tmp/yunet.onnx"));
    }

    #[test]
    fn reject_bad_values() {
        assert!(Opts::try_parse_from(["facematch", "--threshold", "close"]).is_err());
        assert!(Opts::try_parse_from(["facematch", "--format", "xml"]).is_err());
    }
}
