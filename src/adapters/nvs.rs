//! Flash-backed [`StoragePort`].
//!
//! On ESP-IDF each call opens the namespace, does one blob get or
//! set+commit, and closes it again through [`Handle`]'s `Drop`. NVS
//! commits are atomic, so a power cut mid-persist leaves the previous
//! image readable. Names longer than 15 bytes are truncated to fit.
//!
//! Host builds keep blobs in a map keyed by `(namespace, key)`.

use crate::app::ports::{StorageError, StoragePort};
use log::info;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::{
    ESP_ERR_NVS_NEW_VERSION_FOUND, ESP_ERR_NVS_NO_FREE_PAGES, ESP_ERR_NVS_NOT_ENOUGH_SPACE,
    ESP_ERR_NVS_NOT_FOUND, ESP_OK, esp_err_t, nvs_close, nvs_commit, nvs_flash_erase,
    nvs_flash_init, nvs_get_blob, nvs_handle_t, nvs_open, nvs_open_mode_t,
    nvs_open_mode_t_NVS_READONLY, nvs_open_mode_t_NVS_READWRITE, nvs_set_blob,
};
#[cfg(target_os = "espidf")]
use log::warn;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    blobs: HashMap<(String, String), Vec<u8>>,
}

impl NvsAdapter {
    /// Bring up the NVS partition, erasing it if it is full or was
    /// written by a newer IDF.
    pub fn new() -> Result<Self, StorageError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called once from main before anything else uses NVS.
            let mut rc = unsafe { nvs_flash_init() };
            if rc == ESP_ERR_NVS_NO_FREE_PAGES as i32 || rc == ESP_ERR_NVS_NEW_VERSION_FOUND as i32 {
                warn!("NVS: partition unusable (rc={}), erasing", rc);
                rc = unsafe { nvs_flash_erase() };
                if rc == ESP_OK as i32 {
                    rc = unsafe { nvs_flash_init() };
                }
            }
            if rc != ESP_OK as i32 {
                return Err(StorageError::IoError);
            }
            info!("NVS: ready");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NVS: in-memory backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            blobs: HashMap::new(),
        })
    }
}

// ── ESP-IDF ───────────────────────────────────────────────────

/// NUL-terminated copy of `s`, cut to the 15-byte NVS name limit.
#[cfg(target_os = "espidf")]
fn nvs_name(s: &str) -> [u8; 16] {
    let mut out = [0u8; 16];
    let len = s.len().min(15);
    out[..len].copy_from_slice(&s.as_bytes()[..len]);
    out
}

#[cfg(target_os = "espidf")]
fn storage_error(rc: esp_err_t) -> StorageError {
    if rc == ESP_ERR_NVS_NOT_FOUND as i32 {
        StorageError::NotFound
    } else if rc == ESP_ERR_NVS_NOT_ENOUGH_SPACE as i32 {
        StorageError::Full
    } else {
        StorageError::IoError
    }
}

/// Open namespace, closed on drop.
#[cfg(target_os = "espidf")]
struct Handle(nvs_handle_t);

#[cfg(target_os = "espidf")]
impl Handle {
    fn open(namespace: &str, mode: nvs_open_mode_t) -> Result<Self, esp_err_t> {
        let name = nvs_name(namespace);
        let mut raw: nvs_handle_t = 0;
        // SAFETY: `name` is NUL-terminated and outlives the call.
        let rc = unsafe { nvs_open(name.as_ptr().cast(), mode, &mut raw) };
        if rc == ESP_OK as i32 { Ok(Self(raw)) } else { Err(rc) }
    }

    fn get_blob(&self, key: &str, buf: &mut [u8]) -> Result<usize, esp_err_t> {
        let key = nvs_name(key);
        let mut len = buf.len();
        // SAFETY: `len` tells NVS how much of `buf` it may fill.
        let rc = unsafe { nvs_get_blob(self.0, key.as_ptr().cast(), buf.as_mut_ptr().cast(), &mut len) };
        if rc == ESP_OK as i32 { Ok(len) } else { Err(rc) }
    }

    fn set_blob(&self, key: &str, data: &[u8]) -> Result<(), esp_err_t> {
        let key = nvs_name(key);
        // SAFETY: pointers are valid for the lengths given.
        let rc = unsafe { nvs_set_blob(self.0, key.as_ptr().cast(), data.as_ptr().cast(), data.len()) };
        if rc != ESP_OK as i32 {
            return Err(rc);
        }
        let rc = unsafe { nvs_commit(self.0) };
        if rc == ESP_OK as i32 { Ok(()) } else { Err(rc) }
    }
}

#[cfg(target_os = "espidf")]
impl Drop for Handle {
    fn drop(&mut self) {
        // SAFETY: the handle came from a successful nvs_open.
        unsafe { nvs_close(self.0) }
    }
}

#[cfg(target_os = "espidf")]
impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        Handle::open(namespace, nvs_open_mode_t_NVS_READONLY)
            .and_then(|h| h.get_blob(key, buf))
            .map_err(|rc| {
                let e = storage_error(rc);
                if e != StorageError::NotFound {
                    warn!("NVS: read {}/{} failed (rc={})", namespace, key, rc);
                }
                e
            })
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        Handle::open(namespace, nvs_open_mode_t_NVS_READWRITE)
            .and_then(|h| h.set_blob(key, data))
            .map_err(|rc| {
                warn!("NVS: write {}/{} failed (rc={})", namespace, key, rc);
                storage_error(rc)
            })
    }
}

// ── Host ──────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let blob = self
            .blobs
            .get(&(namespace.to_owned(), key.to_owned()))
            .ok_or(StorageError::NotFound)?;
        // A short buffer gets a prefix, like an undersized nvs_get_blob.
        let len = blob.len().min(buf.len());
        buf[..len].copy_from_slice(&blob[..len]);
        Ok(len)
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.blobs
            .insert((namespace.to_owned(), key.to_owned()), data.to_vec());
        Ok(())
    }
}
