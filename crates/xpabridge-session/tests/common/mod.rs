//! A stand-in viewer answering over `MemoryTransport`.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use tracing_subscriber::{EnvFilter, fmt::SubscriberBuilder};
use xpabridge_marshal::{
    ArrayBuffer, ArrayMarshaller, ArrayParams, ByteOrder, ContainerCodec, FitsBlocks,
};
use xpabridge_session::{Launched, Launcher, SessionError};
use xpabridge_transport::{MemoryTransport, Responder};

pub fn init_tracing() {
    let _ = SubscriberBuilder::default()
        .with_test_writer()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

#[derive(Default)]
struct ViewerState {
    image: Option<ArrayBuffer>,
    fits: Option<Vec<u8>>,
    commands: Vec<String>,
}

/// Remembers what it was sent and answers the handful of commands the
/// tests use. Clones share state.
#[derive(Clone, Default)]
pub struct FakeViewer {
    state: Arc<Mutex<ViewerState>>,
}

impl FakeViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands received by set, in order.
    pub fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().commands.clone()
    }

    pub fn image(&self) -> Option<ArrayBuffer> {
        self.state.lock().unwrap().image.clone()
    }

    pub fn show(&self, image: ArrayBuffer) {
        self.state.lock().unwrap().image = Some(image);
    }

    pub fn fits(&self) -> Option<Vec<u8>> {
        self.state.lock().unwrap().fits.clone()
    }

    fn fits_number(&self, pick: impl Fn(&ArrayBuffer) -> i64) -> Result<Vec<u8>, String> {
        let state = self.state.lock().unwrap();
        let image = state.image.as_ref().ok_or("no image loaded")?;
        Ok(format!("{}\n", pick(image)).into_bytes())
    }
}

impl Responder for FakeViewer {
    fn get(&self, params: Option<&str>) -> Result<Vec<u8>, String> {
        let table = xpabridge_marshal::BitpixTable::standard();
        match params.unwrap_or("") {
            "file" => Ok(b"/data/casa.fits  \n".to_vec()),
            "regions" => Ok(b"circle(10,10,5)\n".to_vec()),
            "png" => Ok(vec![0x89, b'P', b'N', b'G', 0x00, b' ', b'\r', b'\n']),
            "fits width" => self.fits_number(|a| a.width() as i64),
            "fits height" => self.fits_number(|a| a.height() as i64),
            "fits depth" => self.fits_number(|a| a.depth() as i64),
            "fits bitpix" => self.fits_number(|a| i64::from(table.bitpix_of(a.kind()).unwrap())),
            "array" => {
                let state = self.state.lock().unwrap();
                let image = state.image.as_ref().ok_or("no image loaded")?;
                Ok(image.with_order(ByteOrder::Native).as_bytes().to_vec())
            }
            "fits" => self
                .state
                .lock()
                .unwrap()
                .fits
                .clone()
                .ok_or_else(|| "no fits loaded".to_string()),
            other => Err(format!("unknown command: {other}")),
        }
    }

    fn set(&self, params: Option<&str>, payload: &[u8]) -> Result<(), String> {
        let params = params.unwrap_or("");
        let mut state = self.state.lock().unwrap();
        state.commands.push(params.to_string());

        if params.starts_with("array") {
            let parsed: ArrayParams = params.parse().map_err(|e| format!("{e}"))?;
            let image = ArrayMarshaller::default()
                .decode(&parsed, payload)
                .map_err(|e| format!("{e}"))?;
            state.image = Some(image);
        } else if params == "fits" {
            FitsBlocks.decode(payload).map_err(|e| format!("{e}"))?;
            state.fits = Some(payload.to_vec());
        } else if params == "broken" {
            return Err("cannot do that".to_string());
        }
        Ok(())
    }
}

/// A launcher that records each launch and, when `register` is set,
/// registers a fresh `FakeViewer` under the launched title.
pub struct FakeLauncher {
    pub transport: Arc<MemoryTransport>,
    pub launched: Mutex<Vec<(String, Vec<String>)>>,
    pub register: bool,
}

impl FakeLauncher {
    pub fn new(transport: Arc<MemoryTransport>, register: bool) -> Self {
        Self {
            transport,
            launched: Mutex::new(Vec::new()),
            register,
        }
    }

    pub fn launches(&self) -> Vec<(String, Vec<String>)> {
        self.launched.lock().unwrap().clone()
    }
}

impl Launcher for FakeLauncher {
    async fn launch(
        &self,
        title: &str,
        extra_args: &[String],
    ) -> Result<Launched, SessionError> {
        self.launched
            .lock()
            .unwrap()
            .push((title.to_string(), extra_args.to_vec()));
        if self.register {
            self.transport.register("DS9", title, FakeViewer::new());
        }
        Ok(Launched {
            program: "ds9".into(),
            pid: Some(4242),
        })
    }
}
