use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use exam_pdf_import::utils::logging;
use exam_pdf_import::{App, BoxKind, Config, CropBox};
use tracing::info;

const USAGE: &str = "用法:
  exam_pdf_import [run]
  exam_pdf_import calibrate <question|answer> <x> <y> <width> <height>
  exam_pdf_import show
  exam_pdf_import reset
  exam_pdf_import preview <pdf> <out.png>";

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("run");

    // 初始化并运行应用
    let mut app = App::initialize(config)?;
    match command {
        "run" => {
            let tests = app.run().await?;
            info!("✓ 共生成 {} 套试卷", tests.len());
        }
        "calibrate" => {
            let (kind, crop) = parse_calibration(&args[1..])?;
            if !app.calibrate(kind, crop)? {
                info!("⚠️ 区域过小（宽高需大于 20 像素），未保存");
            }
        }
        "show" => {
            let calibration = app.calibration();
            for kind in [BoxKind::Question, BoxKind::Answer] {
                match calibration.get(kind) {
                    Some(crop) => info!(
                        "{}: x={:.0} y={:.0} w={:.0} h={:.0}",
                        kind.label(),
                        crop.x,
                        crop.y,
                        crop.width,
                        crop.height
                    ),
                    None => info!("{}: 未设置", kind.label()),
                }
            }
        }
        "reset" => app.reset_calibration()?,
        "preview" => {
            let [pdf, output] = match &args[1..] {
                [pdf, output] => [PathBuf::from(pdf), PathBuf::from(output)],
                _ => bail!("{}", USAGE),
            };
            app.preview(&pdf, &output)?;
        }
        other => bail!("未知命令: {}\n{}", other, USAGE),
    }

    Ok(())
}

fn parse_calibration(args: &[String]) -> Result<(BoxKind, CropBox)> {
    let [kind, x, y, width, height] = args else {
        bail!("{}", USAGE);
    };

    let kind: BoxKind = kind.parse().map_err(anyhow::Error::msg)?;
    let number = |value: &String| -> Result<f32> {
        value
            .parse()
            .with_context(|| format!("无效的坐标: {}", value))
    };

    Ok((
        kind,
        CropBox::new(number(x)?, number(y)?, number(width)?, number(height)?),
    ))
}
