use std::process::{Command, Stdio};

use serde_json::Value;
use tokio::task;

use crate::capture::types::CaptureError;

/// Capture the currently focused Hyprland window using `hyprctl` + `grim`.
pub async fn capture_active_window_hyprland() -> Result<Vec<u8>, CaptureError> {
    task::spawn_blocking(|| -> Result<Vec<u8>, CaptureError> {
        let window = hyprctl_json(&["activewindow", "-j"])?;

        let monitor_id = window.get("monitor").and_then(|v| v.as_i64());
        let monitor_name = window.get("monitor").and_then(|v| v.as_str());
        let scale = hyprland_monitor_scale(monitor_id, monitor_name)?.unwrap_or(1.0);

        let geometry = window_geometry(&window, scale)?;
        grim_geometry(&geometry)
    })
    .await
    .map_err(|e| CaptureError::ImageError(format!("Hyprland capture task failed to join: {}", e)))?
}

/// Capture a user-selected region using `slurp` + `grim` (wlroots fast path).
///
/// Returns `None` when the user aborts the selection; `slurp` signals that by
/// exiting non-zero.
pub async fn capture_selection_slurp() -> Result<Option<Vec<u8>>, CaptureError> {
    task::spawn_blocking(|| -> Result<Option<Vec<u8>>, CaptureError> {
        // `slurp` outputs geometry in the format "x,y widthxheight"
        let output = Command::new("slurp")
            .args(["-f", "%x,%y %wx%h"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                CaptureError::ImageError(format!("Failed to run slurp for region selection: {}", e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            log::info!("Region selection aborted: {}", stderr.trim());
            return Ok(None);
        }

        let geometry_output = String::from_utf8(output.stdout)
            .map_err(|e| CaptureError::InvalidResponse(format!("Invalid slurp output: {}", e)))?;

        let geometry = geometry_output.trim();
        if geometry.is_empty() {
            return Ok(None);
        }

        grim_geometry(geometry).map(Some)
    })
    .await
    .map_err(|e| {
        CaptureError::ImageError(format!("Selection capture task failed to join: {}", e))
    })?
}

fn hyprctl_json(args: &[&str]) -> Result<Value, CaptureError> {
    let output = Command::new("hyprctl")
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| CaptureError::ImageError(format!("Failed to run hyprctl {}: {}", args[0], e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CaptureError::ImageError(format!(
            "hyprctl {} failed: {}",
            args[0],
            stderr.trim()
        )));
    }

    serde_json::from_slice(&output.stdout).map_err(|e| {
        CaptureError::InvalidResponse(format!("Failed to parse hyprctl {} output: {}", args[0], e))
    })
}

/// Turn `hyprctl activewindow -j` output into a grim geometry string,
/// scaled to physical pixels.
fn window_geometry(window: &Value, scale: f64) -> Result<String, CaptureError> {
    let pair = |key: &str| -> Result<(f64, f64), CaptureError> {
        let values = window
            .get(key)
            .and_then(|v| v.as_array())
            .ok_or_else(|| CaptureError::InvalidResponse(format!("Missing '{key}' in hyprctl output")))?;
        match (
            values.first().and_then(|v| v.as_f64()),
            values.get(1).and_then(|v| v.as_f64()),
        ) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err(CaptureError::InvalidResponse(format!(
                "Invalid '{key}' value in hyprctl output"
            ))),
        }
    };

    let (x, y) = pair("at")?;
    let (width, height) = pair("size")?;

    if width <= 0.0 || height <= 0.0 {
        return Err(CaptureError::InvalidResponse(
            "Active window has non-positive dimensions".into(),
        ));
    }

    if (scale - 1.0).abs() > f64::EPSILON {
        log::debug!("Applying monitor scale {:.2} to active window capture", scale);
    }

    Ok(format!(
        "{},{} {}x{}",
        (x * scale).round() as i32,
        (y * scale).round() as i32,
        (width * scale).round() as u32,
        (height * scale).round() as u32
    ))
}

fn grim_geometry(geometry: &str) -> Result<Vec<u8>, CaptureError> {
    log::debug!("Capturing geometry via grim: {}", geometry);
    let grim_output = Command::new("grim")
        .args(["-g", geometry, "-"])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| CaptureError::ImageError(format!("Failed to run grim: {}", e)))?;

    if !grim_output.status.success() {
        let stderr = String::from_utf8_lossy(&grim_output.stderr);
        return Err(CaptureError::ImageError(format!(
            "grim failed: {}",
            stderr.trim()
        )));
    }

    if grim_output.stdout.is_empty() {
        return Err(CaptureError::ImageError(
            "grim returned empty screenshot".into(),
        ));
    }

    Ok(grim_output.stdout)
}

fn hyprland_monitor_scale(
    monitor_id: Option<i64>,
    monitor_name: Option<&str>,
) -> Result<Option<f64>, CaptureError> {
    if monitor_id.is_none() && monitor_name.is_none() {
        return Ok(None);
    }

    let monitors = hyprctl_json(&["monitors", "-j"])?;
    let list = monitors.as_array().ok_or_else(|| {
        CaptureError::InvalidResponse("hyprctl monitors did not return an array".into())
    })?;

    let matched = list.iter().find(|monitor| {
        let id_match = monitor_id.is_some()
            && monitor.get("id").and_then(|v| v.as_i64()) == monitor_id;
        let name_match = monitor_name.is_some()
            && monitor.get("name").and_then(|v| v.as_str()) == monitor_name;
        id_match || name_match
    });

    Ok(matched.map(|monitor| monitor.get("scale").and_then(|v| v.as_f64()).unwrap_or(1.0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn window_geometry_applies_scale() {
        let window = json!({ "at": [10, 20], "size": [300, 200], "monitor": 0 });
        assert_eq!(window_geometry(&window, 1.0).unwrap(), "10,20 300x200");
        assert_eq!(window_geometry(&window, 1.5).unwrap(), "15,30 450x300");
    }

    #[test]
    fn window_geometry_rejects_empty_window() {
        let window = json!({ "at": [0, 0], "size": [0, 200] });
        assert!(matches!(
            window_geometry(&window, 1.0),
            Err(CaptureError::InvalidResponse(_))
        ));
    }

    #[test]
    fn window_geometry_requires_position() {
        let window = json!({ "size": [10, 10] });
        let err = window_geometry(&window, 1.0).unwrap_err();
        assert!(err.to_string().contains("'at'"));
    }
}
