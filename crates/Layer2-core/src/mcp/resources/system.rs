//! `system://` 리소스 - 프로세스/호스트 정보

use apilink_foundation::{ApiRegistry, Error, ResourceDescriptor, ResourceProvider, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

const SYSTEM_RESOURCES: &[(&str, &str, &str)] = &[
    ("info", "System Information", "Versión, plataforma y host del servidor"),
    ("memory", "Memory Usage", "Uso de memoria del proceso"),
    ("cpu", "CPU Information", "Núcleos disponibles y carga del sistema"),
    ("uptime", "Uptime", "Tiempo de ejecución del proceso"),
    ("apis", "Registered APIs", "Resumen de APIs registradas"),
];

pub struct SystemResource {
    registry: Arc<ApiRegistry>,
    started: Instant,
}

impl SystemResource {
    pub fn new(registry: Arc<ApiRegistry>) -> Self {
        Self {
            registry,
            started: Instant::now(),
        }
    }

    fn info(&self) -> Value {
        json!({
            "appVersion": env!("CARGO_PKG_VERSION"),
            "hostname": hostname::get()
                .ok()
                .map(|h| h.to_string_lossy().into_owned()),
            "platform": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
            "family": std::env::consts::FAMILY,
            "pid": std::process::id(),
        })
    }

    fn memory(&self) -> Value {
        let status = std::fs::read_to_string("/proc/self/status").unwrap_or_default();
        json!({
            "residentBytes": proc_status_bytes(&status, "VmRSS"),
            "peakResidentBytes": proc_status_bytes(&status, "VmHWM"),
            "virtualBytes": proc_status_bytes(&status, "VmSize"),
        })
    }

    fn cpu(&self) -> Value {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let loadavg = std::fs::read_to_string("/proc/loadavg")
            .map(|s| parse_loadavg(&s))
            .unwrap_or_default();
        json!({
            "cores": cores,
            "loadavg": loadavg,
        })
    }

    fn uptime(&self) -> Value {
        let elapsed = self.started.elapsed();
        json!({
            "uptimeSeconds": elapsed.as_secs_f64(),
            "uptimeMinutes": elapsed.as_secs() / 60,
        })
    }

    fn apis(&self) -> Value {
        let apis = self.registry.all();
        let summary: Vec<Value> = apis
            .iter()
            .map(|api| {
                json!({
                    "id": api.id,
                    "name": api.name,
                    "type": api.api_type,
                    "active": api.active,
                    "baseUrl": api.base_url,
                    "endpoints": api.endpoints.len(),
                })
            })
            .collect();
        json!({
            "total": apis.len(),
            "active": apis.iter().filter(|a| a.active).count(),
            "apis": summary,
        })
    }
}

/// `/proc/self/status`의 `VmRSS:   1234 kB` 행을 바이트로
fn proc_status_bytes(status: &str, key: &str) -> Option<u64> {
    status
        .lines()
        .find(|line| line.starts_with(key) && line[key.len()..].starts_with(':'))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|kb| kb.parse::<u64>().ok())
        .map(|kb| kb * 1024)
}

fn parse_loadavg(raw: &str) -> Vec<f64> {
    raw.split_whitespace()
        .take(3)
        .filter_map(|v| v.parse().ok())
        .collect()
}

#[async_trait]
impl ResourceProvider for SystemResource {
    fn scheme(&self) -> &str {
        "system"
    }

    fn descriptors(&self) -> Vec<ResourceDescriptor> {
        SYSTEM_RESOURCES
            .iter()
            .map(|(path, name, description)| {
                ResourceDescriptor::new(format!("system://{}", path))
                    .name(*name)
                    .description(*description)
            })
            .collect()
    }

    async fn read(&self, uri: &str) -> Result<Value> {
        debug!("Reading system resource {}", uri);
        let resource = uri.strip_prefix("system://").unwrap_or(uri);

        let data = match resource {
            "info" => self.info(),
            "memory" => self.memory(),
            "cpu" => self.cpu(),
            "uptime" => self.uptime(),
            "apis" => self.apis(),
            other => return Err(Error::NotFound(format!("system resource '{}'", other))),
        };

        Ok(json!({
            "contents": [{
                "uri": uri,
                "mimeType": "application/json",
                "text": serde_json::to_string_pretty(&data)?,
            }]
        }))
    }
}
