//! 图片工具
//!
//! 把答题卡照片转成识别服务接受的 data URI（`data:<mime>;base64,<data>`）。

use base64::{engine::general_purpose, Engine as _};
use phf::phf_map;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::{AppError, AppResult, ExtractionError, FileError};

/// 支持的图片扩展名 → MIME 类型
static IMAGE_MIME_TYPES: phf::Map<&'static str, &'static str> = phf_map! {
    "png" => "image/png",
    "jpg" => "image/jpeg",
    "jpeg" => "image/jpeg",
    "webp" => "image/webp",
    "gif" => "image/gif",
    "bmp" => "image/bmp",
};

static RE_DATA_URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^data:image/[A-Za-z0-9.+-]+;base64,[A-Za-z0-9+/]+=*$").expect("data URI 正则无效")
});

/// 根据扩展名判断是否为支持的图片文件
pub fn is_supported_image(path: &Path) -> bool {
    mime_from_extension(path).is_some()
}

/// 根据扩展名获取 MIME 类型（不区分大小写）
pub fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    IMAGE_MIME_TYPES.get(ext.as_str()).copied()
}

/// 根据文件头检测图片格式，无法识别时返回 `None`
pub fn detect_mime_from_bytes(image_data: &[u8]) -> Option<&'static str> {
    if image_data.len() < 4 {
        return None;
    }

    // JPEG: FF D8 FF
    if image_data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    }
    // PNG: 89 50 4E 47 0D 0A 1A 0A
    else if image_data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some("image/png")
    }
    // GIF8
    else if image_data.starts_with(b"GIF8") {
        Some("image/gif")
    }
    // RIFF....WEBP
    else if image_data.len() >= 12
        && image_data.starts_with(b"RIFF")
        && &image_data[8..12] == b"WEBP"
    {
        Some("image/webp")
    }
    // BM
    else if image_data.starts_with(b"BM") {
        Some("image/bmp")
    } else {
        None
    }
}

/// 把图片字节编码为 data URI
pub fn to_data_uri(mime: &str, image_data: &[u8]) -> String {
    format!("data:{};base64,{}", mime, general_purpose::STANDARD.encode(image_data))
}

/// 读取图片文件并编码为 data URI
///
/// 优先使用文件头判断格式，其次使用扩展名。
pub async fn read_image_as_data_uri(path: &Path) -> AppResult<String> {
    let image_data = tokio::fs::read(path)
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AppError::File(FileError::NotFound {
                path: path.display().to_string(),
            }),
            _ => AppError::file_read_failed(path.display().to_string(), e),
        })?;

    if image_data.is_empty() {
        return Err(ExtractionError::InvalidImage {
            reason: format!("图片文件为空: {}", path.display()),
        }
        .into());
    }

    let mime = detect_mime_from_bytes(&image_data)
        .or_else(|| mime_from_extension(path))
        .ok_or_else(|| ExtractionError::InvalidImage {
            reason: format!("不支持的图片格式: {}", path.display()),
        })?;

    Ok(to_data_uri(mime, &image_data))
}

/// 检查图片数据：必须是 base64 图片 data URI 或 http(s) 地址
pub fn validate_image_payload(payload: &str) -> AppResult<()> {
    let payload = payload.trim();
    if payload.starts_with("http://") || payload.starts_with("https://") {
        return Ok(());
    }

    if RE_DATA_URI.is_match(payload) {
        Ok(())
    } else {
        Err(ExtractionError::InvalidImage {
            reason: "需要 data:<mime>;base64,<data> 格式的图片".to_string(),
        }
        .into())
    }
}
