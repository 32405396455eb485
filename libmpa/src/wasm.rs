use std::io::Cursor;

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::{create_decoder, ErrorPolicy, MpegFrameCodec, StreamDecoder, StreamError};

/// turn an error into js
fn to_js_err(e: StreamError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// header fields handed to js
#[derive(Serialize)]
struct HeaderInfo {
    version: String,
    layer: String,
    channel_mode: &'static str,
    channels: usize,
    sample_rate: u32,
    bitrate_kbps: u32,
    vbr: bool,
    samples_per_frame: usize,
}

#[wasm_bindgen]
pub struct WasmStreamDecoder {
    inner: StreamDecoder<MpegFrameCodec<Cursor<Vec<u8>>>>,
}

#[wasm_bindgen]
impl WasmStreamDecoder {
    /// Probe an in-memory MPEG audio stream
    ///
    /// `policy` takes the same strings as the CLI (`none`, `moderate`,
    /// `moderate=N`, `all`); missing means the default moderate budget.
    #[wasm_bindgen(constructor)]
    pub fn new(data: Vec<u8>, policy: Option<String>) -> Result<WasmStreamDecoder, JsValue> {
        console_error_panic_hook::set_once();

        let policy = match policy {
            Some(text) => text.parse::<ErrorPolicy>().map_err(|e| JsValue::from_str(&e))?,
            None => ErrorPolicy::default(),
        };
        let inner = create_decoder(Cursor::new(data), policy).map_err(to_js_err)?;
        Ok(Self { inner })
    }

    /// first frame header as a plain object
    #[wasm_bindgen]
    pub fn header(&self) -> Result<JsValue, JsValue> {
        let header = self.inner.current_header().map_err(to_js_err)?;
        let info = HeaderInfo {
            version: header.version().to_string(),
            layer: header.layer().to_string(),
            channel_mode: header.channel_mode().name(),
            channels: header.channels(),
            sample_rate: header.sample_rate(),
            bitrate_kbps: header.bitrate_kbps(),
            vbr: header.is_vbr(),
            samples_per_frame: header.samples_per_frame(),
        };
        serde_wasm_bindgen::to_value(&info).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Decode the next frame
    ///
    /// Returns interleaved f32 samples, or null at the end of the stream.
    #[wasm_bindgen]
    pub fn next_frame(&mut self) -> Result<JsValue, JsValue> {
        match self.inner.next_frame() {
            Ok(Some(frame)) => {
                let samples = frame.into_samples().unwrap_or_default();
                let array = js_sys::Float32Array::new_with_length(samples.len() as u32);
                array.copy_from(&samples);
                Ok(array.into())
            }
            Ok(None) => Ok(JsValue::NULL),
            Err(e) => Err(to_js_err(e)),
        }
    }

    /// skip the next frame, returns its per-channel sample count or null
    #[wasm_bindgen]
    pub fn skip_frame(&mut self) -> Result<JsValue, JsValue> {
        match self.inner.skip_frame() {
            Ok(Some(frame)) => Ok(JsValue::from_f64(frame.sample_count() as f64)),
            Ok(None) => Ok(JsValue::NULL),
            Err(e) => Err(to_js_err(e)),
        }
    }

    #[wasm_bindgen]
    pub fn valid_frames(&self) -> f64 {
        self.inner.valid_frames_decoded() as f64
    }

    #[wasm_bindgen]
    pub fn may_have_more_frames(&self) -> bool {
        self.inner.may_have_more_frames()
    }

    /// estimated seconds for a stream of `len` bytes
    #[wasm_bindgen]
    pub fn estimate_duration(&self, len: f64) -> Result<f64, JsValue> {
        self.inner.estimate_duration(len as u64).map_err(to_js_err)
    }

    #[wasm_bindgen]
    pub fn estimate_frame_count(&self, len: f64) -> Result<f64, JsValue> {
        self.inner
            .estimate_frame_count(len as u64)
            .map(|count| count as f64)
            .map_err(to_js_err)
    }
}
