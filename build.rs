/// Rejects `gpu-metal` outside Apple targets.
///
/// `gpu-metal` pulls the local engine's Metal kernels into the build, and
/// those only link against Apple's frameworks. Without this check a Linux or
/// Windows build with the feature fails deep inside the engine's dependencies.
fn main() {
    if std::env::var_os("CARGO_FEATURE_GPU_METAL").is_none() {
        return;
    }
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if !matches!(target_os.as_str(), "macos" | "ios") {
        panic!(
            "judge-relay: `gpu-metal` needs a macOS or iOS target, not `{target_os}`. \
             Build the local engine with `gpu-cuda` or plain `backend-mistralrs` instead."
        );
    }
}
