#[cfg(windows)]
pub fn setup_console() {
    use windows_sys::Win32::System::Console::{
        GetStdHandle, GetConsoleMode, SetConsoleMode, SetConsoleOutputCP,
        STD_OUTPUT_HANDLE, ENABLE_VIRTUAL_TERMINAL_PROCESSING,
    };
    unsafe {
        SetConsoleOutputCP(65001);
        let handle = GetStdHandle(STD_OUTPUT_HANDLE);
        let mut mode = 0;
        if GetConsoleMode(handle, &mut mode) != 0 {
            SetConsoleMode(handle, mode | ENABLE_VIRTUAL_TERMINAL_PROCESSING);
        }
    }
}

#[cfg(not(windows))]
pub fn setup_console() {}

#[cfg(windows)]
pub fn beep(frequency_hz: u32, duration_ms: u32) -> std::io::Result<()> {
    use windows_sys::Win32::System::Diagnostics::Debug::Beep;
    if unsafe { Beep(frequency_hz, duration_ms) } == 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

// No tone control outside Windows; ring the terminal bell instead.
#[cfg(not(windows))]
pub fn beep(_frequency_hz: u32, _duration_ms: u32) -> std::io::Result<()> {
    use std::io::Write;
    let mut stdout = std::io::stdout();
    stdout.write_all(b"\x07")?;
    stdout.flush()
}

/// Cuts `text` to at most `max` characters without splitting a code point.
pub fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
