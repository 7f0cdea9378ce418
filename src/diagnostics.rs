/// Tagged diagnostic lines: `[scope] message`.
pub fn format_line(scope: &str, message: &str) -> String {
    if message.trim().is_empty() {
        format!("[{scope}]")
    } else {
        format!("[{scope}] {message}")
    }
}

#[inline]
pub fn log_diag(scope: &str, message: &str) {
    let line = format_line(scope, message);
    #[cfg(target_arch = "wasm32")]
    {
        gloo_console::log!(line);
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        eprintln!("{line}");
    }
}

#[inline]
pub fn log_error(scope: &str, message: &str) {
    let line = format_line(scope, message);
    #[cfg(target_arch = "wasm32")]
    {
        gloo_console::error!(line);
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        eprintln!("{line}");
    }
}
