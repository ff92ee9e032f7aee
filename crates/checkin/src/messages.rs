//! Localized status messages
//!
//! Guidance returned by the remote analyzer is shown verbatim and never
//! goes through this catalogue.

use camera_capture::CameraError;
use presence::DetectorError;
use serde::{Deserialize, Serialize};

/// Languages the application ships
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "zh")]
    Chinese,
    #[serde(rename = "ms")]
    Malay,
    #[serde(rename = "ta")]
    Tamil,
}

/// Status message identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKey {
    ScanPrompt,
    PlaceFaceInOval,
    Scanning,
    FaceDetected,
    FaceNotDetected,
    AttemptsRemaining,
    TooDark,
    TooBright,
    DetectionFailed,
    RateLimited,
    QuotaExhausted,
    CameraPermissionDenied,
    CameraNotFound,
    CameraBusy,
    CameraFailed,
    UseManualCheckIn,
    ManualCheckIn,
    CheckedIn,
}

/// Message lookup for one language, falling back to English
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageCatalog {
    language: Language,
}

impl MessageCatalog {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn text(&self, key: MessageKey) -> &'static str {
        self.localized(key).unwrap_or_else(|| english(key))
    }

    fn localized(&self, key: MessageKey) -> Option<&'static str> {
        match self.language {
            Language::English => None,
            Language::Chinese => chinese(key),
            Language::Malay => malay(key),
            Language::Tamil => tamil(key),
        }
    }

    /// "N attempts remaining"
    pub fn attempts_remaining(&self, remaining: u32) -> String {
        format!("{} {}", remaining, self.text(MessageKey::AttemptsRemaining))
    }

    /// Fallback explanation for a camera error; untranslated ones use the
    /// error's own reason
    pub fn camera_error(&self, error: &CameraError) -> &'static str {
        let key = match error {
            CameraError::PermissionDenied => MessageKey::CameraPermissionDenied,
            CameraError::DeviceNotFound => MessageKey::CameraNotFound,
            CameraError::DeviceBusy => MessageKey::CameraBusy,
            CameraError::Unknown(_) => MessageKey::CameraFailed,
        };
        self.localized(key).unwrap_or_else(|| error.reason())
    }

    pub fn detector_error(&self, error: &DetectorError) -> &'static str {
        self.text(match error {
            DetectorError::RateLimited => MessageKey::RateLimited,
            DetectorError::QuotaExhausted => MessageKey::QuotaExhausted,
            _ => MessageKey::DetectionFailed,
        })
    }
}

fn english(key: MessageKey) -> &'static str {
    match key {
        MessageKey::ScanPrompt => "Place your face in the oval to check in",
        MessageKey::PlaceFaceInOval => "Position your face within the oval",
        MessageKey::Scanning => "Scanning...",
        MessageKey::FaceDetected => "Face detected! Checking in...",
        MessageKey::FaceNotDetected => "Face not detected. Please try again.",
        MessageKey::AttemptsRemaining => "attempts remaining",
        MessageKey::TooDark => "Too dark. Please find better lighting.",
        MessageKey::TooBright => "Too bright. Please move away from direct light.",
        MessageKey::DetectionFailed => "Detection failed. Please try again.",
        MessageKey::RateLimited => "Too many requests. Please wait a moment.",
        MessageKey::QuotaExhausted => "Face check is unavailable right now.",
        MessageKey::CameraPermissionDenied => CameraError::PermissionDenied.reason(),
        MessageKey::CameraNotFound => CameraError::DeviceNotFound.reason(),
        MessageKey::CameraBusy => CameraError::DeviceBusy.reason(),
        MessageKey::CameraFailed => CameraError::Unknown(String::new()).reason(),
        MessageKey::UseManualCheckIn => "Please use the button below to check in.",
        MessageKey::ManualCheckIn => "Check In Manually",
        MessageKey::CheckedIn => "Checked in. Thank you!",
    }
}

fn chinese(key: MessageKey) -> Option<&'static str> {
    Some(match key {
        MessageKey::ScanPrompt => "将您的脸放入椭圆框内进行签到",
        MessageKey::PlaceFaceInOval => "请将脸部对准椭圆框内",
        MessageKey::Scanning => "扫描中...",
        MessageKey::FaceDetected => "已检测到面部！正在签到...",
        MessageKey::FaceNotDetected => "未检测到面部，请重试。",
        MessageKey::AttemptsRemaining => "次尝试剩余",
        MessageKey::TooDark => "光线太暗，请到更明亮的地方。",
        MessageKey::TooBright => "光线太强，请避开直射光。",
        MessageKey::DetectionFailed => "检测失败，请重试。",
        MessageKey::RateLimited => "请求过多，请稍候。",
        MessageKey::QuotaExhausted => "面部检测暂时不可用。",
        MessageKey::CameraPermissionDenied => "未获得摄像头权限。",
        MessageKey::CameraNotFound => "此设备上未找到摄像头。",
        MessageKey::CameraBusy => "摄像头正被其他应用使用。",
        MessageKey::CameraFailed => "无法启动摄像头。",
        MessageKey::UseManualCheckIn => "请使用下方按钮签到。",
        MessageKey::ManualCheckIn => "手动签到",
        MessageKey::CheckedIn => "签到成功，谢谢！",
    })
}

fn malay(key: MessageKey) -> Option<&'static str> {
    Some(match key {
        MessageKey::ScanPrompt => "Letakkan muka anda dalam bujur untuk daftar masuk",
        MessageKey::PlaceFaceInOval => "Letakkan muka anda di dalam bujur",
        MessageKey::Scanning => "Mengimbas...",
        MessageKey::FaceDetected => "Muka dikesan! Mendaftar masuk...",
        MessageKey::FaceNotDetected => "Muka tidak dikesan. Sila cuba lagi.",
        MessageKey::AttemptsRemaining => "percubaan berbaki",
        MessageKey::TooDark => "Terlalu gelap. Sila cari tempat yang lebih terang.",
        MessageKey::TooBright => "Terlalu terang. Sila jauhi cahaya terus.",
        MessageKey::DetectionFailed => "Pengesanan gagal. Sila cuba lagi.",
        MessageKey::RateLimited => "Terlalu banyak permintaan. Sila tunggu sebentar.",
        MessageKey::QuotaExhausted => "Semakan muka tidak tersedia buat masa ini.",
        MessageKey::CameraPermissionDenied => "Akses kamera tidak dibenarkan.",
        MessageKey::CameraNotFound => "Tiada kamera ditemui pada peranti ini.",
        MessageKey::CameraBusy => "Kamera sedang digunakan oleh aplikasi lain.",
        MessageKey::CameraFailed => "Kamera tidak dapat dimulakan.",
        MessageKey::UseManualCheckIn => "Sila gunakan butang di bawah untuk daftar masuk.",
        MessageKey::ManualCheckIn => "Daftar Masuk Manual",
        MessageKey::CheckedIn => "Berjaya daftar masuk. Terima kasih!",
    })
}

fn tamil(key: MessageKey) -> Option<&'static str> {
    match key {
        MessageKey::ScanPrompt => Some("பதிவு செய்ய உங்கள் முகத்தை நீள்வட்டத்தில் வைக்கவும்"),
        MessageKey::PlaceFaceInOval => Some("உங்கள் முகத்தை நீள்வட்டத்திற்குள் வைக்கவும்"),
        MessageKey::Scanning => Some("ஸ்கேன் செய்கிறது..."),
        MessageKey::FaceDetected => Some("முகம் கண்டறியப்பட்டது! பதிவு செய்கிறது..."),
        MessageKey::FaceNotDetected => Some("முகம் கண்டறியப்படவில்லை. மீண்டும் முயற்சிக்கவும்."),
        MessageKey::AttemptsRemaining => Some("முயற்சிகள் மீதமுள்ளன"),
        MessageKey::ManualCheckIn => Some("கைமுறையாக பதிவு செய்"),
        _ => None,
    }
}
