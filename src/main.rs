use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;

use card_classify::config::{Config, DEFAULT_CONFIG};
use card_classify::models::rec_result::OutputRec;
use card_classify::my_utils::io::{load_rgb_image, save_image, write_json};
use card_classify::recognition::annotate::{draw_cards, label_font};
use card_classify::recognition::engine::Engine;

/// 识别照片中的卡片并标注颜色和符号
#[derive(Parser)]
#[command(name = "card_classify")]
#[command(about = "Locate, rectify and classify cards in a photo")]
struct Args {
    /// 输入图片
    input: PathBuf,

    /// 标注结果的保存路径
    #[arg(short, long, default_value = "detected.jpg")]
    output: PathBuf,

    /// yaml配置文件，缺省使用内置参数
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 期望的卡片数量
    #[arg(short, long, default_value_t = 4)]
    expected: usize,

    /// 识别结果另存为json
    #[arg(long)]
    json: Option<PathBuf>,

    /// 标签字体，覆盖配置中的font_path
    #[arg(long)]
    font: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_yaml_file(path)?,
        None => DEFAULT_CONFIG.clone(),
    };
    if args.font.is_some() {
        config.annotate.font_path = args.font.clone();
    }
    let engine = Engine::new(config)?;

    let img = load_rgb_image(&args.input)?;
    let cards = engine.recognize_exact(&img, args.expected)?;
    for (i, card) in cards.iter().enumerate() {
        info!(
            "card {i}: {} at ({:.0}, {:.0})",
            card.label(),
            card.center.x,
            card.center.y
        );
    }

    let font = label_font(&engine.config().annotate)?;
    let annotated = draw_cards(&img, &cards, &engine.config().annotate, font.as_ref());
    save_image(&annotated, &args.output)?;
    info!("saved annotated image to {:?}", args.output);

    if let Some(path) = &args.json {
        write_json(&OutputRec::new(&img, &cards), path)?;
        info!("saved result to {path:?}");
    }
    Ok(())
}
