use std::collections::HashSet;
use std::process::Command;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::device::accessor::{DeviceAccessor, ElementQuery, Key, Window};
use crate::device::hierarchy::{parse_hierarchy, query, resolve, resolve_index};
use crate::error::TraversalError;
use crate::screen::screen_model::{Point, UiElement};

/// Port the uiautomator2 server listens on inside the device.
const DEVICE_RPC_PORT: u16 = 9008;
const RPC_TIMEOUT: Duration = Duration::from_secs(30);
const LONG_PRESS_MS: u64 = 1000;

static FOCUS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:mCurrentFocus|mFocusedApp)=.*?\s([\w.]+)/([\w.$]+)").unwrap()
});

// Selector mask bits understood by the on-device server.
const MASK_CLASS_NAME: u32 = 0x10;
const MASK_DESCRIPTION: u32 = 0x40;
const MASK_RESOURCE_ID: u32 = 0x20_0000;
const MASK_INSTANCE: u32 = 0x100_0000;

/// JSON-RPC request posted to `/jsonrpc/0`.
#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: Value,
}

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
pub struct RpcErrorBody {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub current_package_name: String,
    pub display_width: u32,
    pub display_height: u32,
}

/// Device accessor backed by the uiautomator2 server running on an Android
/// device, plus `adb` for app lifecycle, screenshots and raw input.
///
/// Element snapshots passed to gesture methods are re-resolved against a
/// fresh hierarchy dump before acting, so a stale snapshot fails with
/// `ActionFailed` instead of tapping whatever now occupies its bounds.
pub struct U2Device {
    serial: Option<String>,
    endpoint: String,
    client: Client,
    next_id: u64,
}

impl U2Device {
    /// Connect to a device. Without an explicit endpoint, a local port is
    /// forwarded to the on-device server with `adb forward`.
    pub fn connect(serial: Option<&str>, endpoint: Option<&str>) -> Result<Self, TraversalError> {
        let serial = serial.map(str::to_string);

        let endpoint = match endpoint {
            Some(e) => e.trim_end_matches('/').to_string(),
            None => {
                let out = run_adb(
                    serial.as_deref(),
                    &["forward", "tcp:0", &format!("tcp:{}", DEVICE_RPC_PORT)],
                )?;
                let port: u16 = String::from_utf8_lossy(&out).trim().parse().map_err(|_| {
                    TraversalError::DeviceUnavailable("adb forward returned no port".into())
                })?;
                format!("http://127.0.0.1:{}", port)
            }
        };

        let client = Client::builder()
            .timeout(RPC_TIMEOUT)
            .build()
            .map_err(|e| TraversalError::DeviceUnavailable(format!("http client: {}", e)))?;

        let mut device = U2Device {
            serial,
            endpoint,
            client,
            next_id: 1,
        };

        let info = device.device_info()?;
        info!(
            endpoint = %device.endpoint,
            package = %info.current_package_name,
            "connected to device"
        );
        Ok(device)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Invoke an RPC method and return its `result`.
    fn call(&mut self, method: &str, params: Value) -> Result<Value, TraversalError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id,
            method,
            params,
        };
        self.next_id += 1;

        let response = self
            .client
            .post(format!("{}/jsonrpc/0", self.endpoint))
            .json(&request)
            .send()
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    TraversalError::DeviceUnavailable(format!("{}: {}", method, e))
                } else {
                    TraversalError::Rpc {
                        method: method.into(),
                        message: e.to_string(),
                    }
                }
            })?;

        if !response.status().is_success() {
            return Err(TraversalError::Rpc {
                method: method.into(),
                message: format!("HTTP {}", response.status()),
            });
        }

        let body: RpcResponse = response.json().map_err(|e| TraversalError::Rpc {
            method: method.into(),
            message: format!("invalid response body: {}", e),
        })?;

        if let Some(err) = body.error {
            return Err(TraversalError::Rpc {
                method: method.into(),
                message: format!("{} (code {})", err.message, err.code),
            });
        }

        Ok(body.result.unwrap_or(Value::Null))
    }

    pub fn device_info(&mut self) -> Result<DeviceInfo, TraversalError> {
        let raw = self.call("deviceInfo", json!([]))?;
        serde_json::from_value(raw).map_err(|e| TraversalError::JsonParse {
            context: "deviceInfo".into(),
            source: e,
        })
    }

    fn shell(&self, args: &[&str]) -> Result<String, TraversalError> {
        let mut full = vec!["shell"];
        full.extend_from_slice(args);
        let out = run_adb(self.serial.as_deref(), &full)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// Resumed activity of `package`, read from the window manager.
    fn current_activity(&self, package: &str) -> Option<String> {
        let dump = self
            .shell(&["dumpsys", "window"])
            .map_err(|e| debug!(error = %e, "dumpsys window failed"))
            .ok()?;

        FOCUS_RE
            .captures_iter(&dump)
            .find(|caps| &caps[1] == package)
            .map(|caps| caps[2].to_string())
    }

    fn nodes(&mut self) -> Result<Vec<UiElement>, TraversalError> {
        let xml = self.dump_hierarchy()?;
        parse_hierarchy(&xml)
    }

    /// Live counterpart of a snapshot, or `ActionFailed` if it is gone.
    fn resolve_live(&mut self, snapshot: &UiElement) -> Result<UiElement, TraversalError> {
        let nodes = self.nodes()?;
        resolve(&nodes, snapshot).cloned().ok_or_else(|| {
            TraversalError::action_failed(snapshot.label(), "element no longer on screen")
        })
    }

    fn click_point(&mut self, point: Point) -> Result<(), TraversalError> {
        self.call("click", json!([point.x, point.y]))?;
        Ok(())
    }

    fn packages(&self, third_party_only: bool) -> Result<Vec<String>, TraversalError> {
        let mut args = vec!["pm", "list", "packages"];
        if third_party_only {
            args.push("-3");
        }
        let out = self.shell(&args)?;
        Ok(out
            .lines()
            .filter_map(|l| l.trim().strip_prefix("package:"))
            .map(str::to_string)
            .collect())
    }

    fn launch_package(&self, package: &str) -> Result<bool, TraversalError> {
        let out = self.shell(&[
            "monkey",
            "-p",
            package,
            "-c",
            "android.intent.category.LAUNCHER",
            "1",
        ])?;
        Ok(!out.contains("No activities found") && !out.contains("monkey aborted"))
    }
}

/// Server-side selector for `nodes[index]`: class plus resource id or
/// description, and the instance among nodes matching those fields.
///
/// Text is left out since it is what `setText` is about to change.
pub fn selector_for(nodes: &[UiElement], index: usize) -> Value {
    let target = &nodes[index];
    let non_empty = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(str::to_string);
    let resource_id = non_empty(&target.resource_id);
    let description = match resource_id {
        Some(_) => None,
        None => non_empty(&target.description),
    };

    let same_fields = |n: &UiElement| {
        n.class_name == target.class_name
            && resource_id.as_ref().is_none_or(|id| non_empty(&n.resource_id).as_ref() == Some(id))
            && description.as_ref().is_none_or(|d| non_empty(&n.description).as_ref() == Some(d))
    };
    let instance = nodes[..index].iter().filter(|n| same_fields(n)).count();

    let mut mask = MASK_CLASS_NAME | MASK_INSTANCE;
    let mut selector = json!({
        "childOrSibling": [],
        "childOrSiblingSelector": [],
        "className": target.class_name,
        "instance": instance,
    });
    if let Some(id) = resource_id {
        mask |= MASK_RESOURCE_ID;
        selector["resourceId"] = json!(id);
    } else if let Some(desc) = description {
        mask |= MASK_DESCRIPTION;
        selector["description"] = json!(desc);
    }
    selector["mask"] = json!(mask);
    selector
}

fn run_adb(serial: Option<&str>, args: &[&str]) -> Result<Vec<u8>, TraversalError> {
    let mut command = Command::new("adb");
    if let Some(s) = serial {
        command.args(["-s", s]);
    }
    let output = command
        .args(args)
        .output()
        .map_err(|e| TraversalError::SubprocessSpawn {
            program: "adb".into(),
            source: e,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if stderr.contains("not found") || stderr.contains("offline") || stderr.contains("no devices")
        {
            return Err(TraversalError::DeviceUnavailable(stderr));
        }
        return Err(TraversalError::SubprocessFailed {
            program: format!("adb {}", args.join(" ")),
            status: output.status,
            stderr,
        });
    }
    Ok(output.stdout)
}

impl DeviceAccessor for U2Device {
    fn current_window(&mut self) -> Result<Window, TraversalError> {
        let info = self.device_info()?;
        let activity = self
            .current_activity(&info.current_package_name)
            .unwrap_or_else(|| "unknown".to_string());
        Ok(Window {
            package: info.current_package_name,
            activity,
        })
    }

    fn window_size(&mut self) -> Result<(u32, u32), TraversalError> {
        let info = self.device_info()?;
        Ok((info.display_width, info.display_height))
    }

    fn screenshot(&mut self) -> Result<Vec<u8>, TraversalError> {
        run_adb(self.serial.as_deref(), &["exec-out", "screencap", "-p"])
    }

    fn dump_hierarchy(&mut self) -> Result<String, TraversalError> {
        match self.call("dumpWindowHierarchy", json!([false, 50]))? {
            Value::String(xml) => Ok(xml),
            other => Err(TraversalError::Hierarchy(format!(
                "expected XML string, got {}",
                other
            ))),
        }
    }

    fn query_elements(&mut self, q: &ElementQuery) -> Result<Vec<UiElement>, TraversalError> {
        let nodes = self.nodes()?;
        Ok(query(&nodes, q))
    }

    fn tap(&mut self, element: &UiElement) -> Result<(), TraversalError> {
        let live = self.resolve_live(element)?;
        self.click_point(live.bounds.center())
    }

    fn long_press(&mut self, element: &UiElement) -> Result<(), TraversalError> {
        let live = self.resolve_live(element)?;
        let c = live.bounds.center();
        let (x, y) = (c.x.to_string(), c.y.to_string());
        self.shell(&["input", "swipe", &x, &y, &x, &y, &LONG_PRESS_MS.to_string()])?;
        Ok(())
    }

    fn set_text(&mut self, element: &UiElement, text: &str) -> Result<(), TraversalError> {
        let nodes = self.nodes()?;
        let index = resolve_index(&nodes, element).ok_or_else(|| {
            TraversalError::action_failed(element.label(), "element no longer on screen")
        })?;
        let replaced = self.call("setText", json!([selector_for(&nodes, index), text]))?;
        if replaced == Value::Bool(false) {
            return Err(TraversalError::action_failed(element.label(), "setText rejected"));
        }
        Ok(())
    }

    fn swipe(&mut self, from: Point, to: Point, duration: Duration) -> Result<(), TraversalError> {
        // The server moves 5 ms per step.
        let steps = ((duration.as_secs_f64() * 200.0) as i64).max(1);
        self.call("swipe", json!([from.x, from.y, to.x, to.y, steps]))?;
        Ok(())
    }

    fn press_key(&mut self, key: Key) -> Result<(), TraversalError> {
        self.call("pressKey", json!([key.name()]))?;
        Ok(())
    }

    fn start_app(&mut self, identifier: &str) -> Result<bool, TraversalError> {
        if identifier.contains('.') {
            let started = self.launch_package(identifier)?;
            info!(package = identifier, started, "launching app by package");
            return Ok(started);
        }

        let wanted = identifier.to_lowercase();
        let package = self
            .packages(false)?
            .into_iter()
            .find(|p| p.to_lowercase().contains(&wanted));

        match package {
            Some(package) => {
                let started = self.launch_package(&package)?;
                info!(name = identifier, package = %package, started, "launching app by name");
                Ok(started)
            }
            None => {
                warn!(name = identifier, "no installed app matches");
                Ok(false)
            }
        }
    }

    fn stop_all_apps(&mut self) -> Result<(), TraversalError> {
        let running: HashSet<String> = self
            .shell(&["ps", "-A", "-o", "NAME"])?
            .lines()
            .map(|l| l.trim().to_string())
            .collect();

        // Third-party apps that are running, plus whatever is in front
        // (system apps such as Settings are not in the -3 list).
        let mut targets: Vec<String> = self
            .packages(true)?
            .into_iter()
            .filter(|p| running.contains(p))
            .collect();
        let foreground = self.device_info()?.current_package_name;
        if !targets.contains(&foreground) {
            targets.push(foreground);
        }

        for package in targets {
            if package.starts_with("com.github.uiautomator") {
                continue;
            }
            debug!(package = %package, "force-stopping");
            self.shell(&["am", "force-stop", &package])?;
        }
        Ok(())
    }
}
