use argh::FromArgs;
use glamx::UVec2;
use std::sync::LazyLock;

fn window_size(size: &str) -> Result<Option<UVec2>, String> {
    let char = if size.contains('x') { 'x' } else { ',' };

    let mut split = size.split(char);
    let x: Option<u32> = split.next().and_then(|x| x.trim().parse().ok());
    let y: Option<u32> = split.next().and_then(|y| y.trim().parse().ok());

    let size = match (x, y) {
        (Some(x), Some(y)) => UVec2::new(x, y),
        (Some(x), _) => UVec2::new(x, x),
        _ => return Ok(None),
    };

    Ok(Some(size))
}

/// Bridge arguments
#[derive(Debug, Default, FromArgs)]
pub struct BridgeArgs {
    #[argh(option, hidden_help)]
    pub target_fps: Option<u32>,
    #[argh(switch, hidden_help)]
    pub unlimited_fps: bool,

    #[argh(option, hidden_help)]
    pub builder_budget_ms: Option<u64>,
    #[argh(option, hidden_help)]
    pub transient_budget_ms: Option<u64>,
    #[argh(option, hidden_help)]
    pub destroy_after: Option<u64>,
    #[argh(option, hidden_help)]
    pub log_interval_ms: Option<u64>,

    #[argh(option, hidden_help, from_str_fn(window_size))]
    pub window_size: Option<Option<UVec2>>,
}

impl BridgeArgs {
    fn init() -> Option<BridgeArgs> {
        let mut args = std::env::args();
        let cmd_name = args.next()?;
        let args: Vec<String> = args.collect();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        BridgeArgs::from_args(&[&cmd_name], &args).ok()
    }

    /// Process arguments, parsed once. Unknown or malformed arguments fall back to defaults.
    pub fn get() -> &'static BridgeArgs {
        static INSTANCE: LazyLock<BridgeArgs> =
            LazyLock::new(|| BridgeArgs::init().unwrap_or_default());
        &INSTANCE
    }
}
