mod compare;
mod detect;

use std::process::ExitCode;

pub use compare::*;
pub use detect::*;

use crate::config::Opts;
use crate::error::Error;

pub trait SubCommandExtend {
    fn run(&self, opts: &Opts) -> anyhow::Result<()>;
}

/// 命令失败时输出的提示与退出码
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub message: String,
    /// 是否输出到标准输出，否则输出到标准错误
    pub stdout: bool,
    pub code: u8,
}

impl ErrorReport {
    pub fn new(err: &anyhow::Error) -> Self {
        // 人脸数量错误属于输入问题，只打印一行提示
        let encoding = err.chain().find_map(|e| match e.downcast_ref::<Error>() {
            Some(Error::Encoding(e)) => Some(e),
            _ => None,
        });
        match encoding {
            Some(e) => Self { message: format!("Encoding Error: {e}"), stdout: true, code: 1 },
            None => Self { message: format!("Error: {err:#}"), stdout: false, code: 2 },
        }
    }

    pub fn print(&self) -> ExitCode {
        if self.stdout {
            println!("{}", self.message);
        } else {
            eprintln!("{}", self.message);
        }
        ExitCode::from(self.code)
    }
}
