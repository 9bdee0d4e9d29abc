//! User-facing strings shown by the lab front end.

use std::time::Duration;

pub const INVALID_TOKEN: &str = "Token tidak valid atau sudah digunakan";
pub const UNAUTHORIZED: &str = "Akses admin ditolak";
pub const UPSTREAM_UNAVAILABLE: &str = "Layanan lab sedang tidak aktif. Silakan coba lagi nanti.";
pub const AUTH_TIMEOUT: &str = "Waktu autentikasi habis. Koneksi akan ditutup.";
pub const SESSION_ENDED: &str = "Sesi diakhiri. Terima kasih!";
pub const SERVER_SHUTDOWN: &str = "Server lab sedang dihentikan. Koneksi akan ditutup.";

pub fn server_full(max_sessions: usize) -> String {
    format!("Server penuh ({max_sessions}/{max_sessions} sesi). Silakan coba lagi nanti.")
}

pub fn session_timeout(duration: Duration) -> String {
    format!(
        "Waktu sesi Anda telah habis ({}). Koneksi akan ditutup.",
        indonesian_duration(duration)
    )
}

pub fn welcome_banner(duration: Duration, prompt: &str) -> String {
    format!(
        "\r\nWelcome to Linux Terminal Simulation Lab\r\n\
         Ubuntu 22.04 LTS - Session Duration: {}\r\n\
         {}\r\n\
         Type \"help\" for available commands\r\n\r\n\
         {prompt}",
        english_duration(duration),
        "=".repeat(50),
    )
}

fn indonesian_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 && secs % 3600 == 0 {
        format!("{} jam", secs / 3600)
    } else if secs >= 60 && secs % 60 == 0 {
        format!("{} menit", secs / 60)
    } else {
        format!("{secs} detik")
    }
}

fn english_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (amount, unit) = if secs >= 3600 && secs % 3600 == 0 {
        (secs / 3600, "hour")
    } else if secs >= 60 && secs % 60 == 0 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };
    if amount == 1 {
        format!("1 {unit}")
    } else {
        format!("{amount} {unit}s")
    }
}
