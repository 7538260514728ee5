//! Turns a color string into registry writes.

use crate::descriptor::ColorDescriptor;
use crate::encoding::RegistryEncoding;
use crate::store::{ConfigStoreWriter, RegistryValue, RegistryWrite, WriteBatch};
use crate::ApplyError;

const PERSONALIZE: &str = r"Software\Microsoft\Windows\CurrentVersion\Themes\Personalize";
const EXPLORER_ACCENT: &str = r"Software\Microsoft\Windows\CurrentVersion\Explorer\Accent";
const DWM: &str = r"Software\Microsoft\Windows\DWM";
const CLASSIC_COLORS: &str = r"Control Panel\Colors";

/// The full set of per-user writes for one accent color.
///
/// Several Windows builds read the accent from different places, so the
/// DWORD lands under every key known to carry it.
pub fn accent_batch(enc: &RegistryEncoding) -> WriteBatch {
    use RegistryValue::{Binary, Dword};

    let dword = enc.dword_value;
    let rgb = enc.rgb_string();

    [
        RegistryWrite::new(PERSONALIZE, "ColorPrevalence", Dword(1)),
        RegistryWrite::new(PERSONALIZE, "AccentColor", Dword(dword)),
        RegistryWrite::new(EXPLORER_ACCENT, "AccentPalette", Binary(enc.palette_bytes())),
        RegistryWrite::new(EXPLORER_ACCENT, "AccentColor", Dword(dword)),
        RegistryWrite::new(EXPLORER_ACCENT, "AccentColorMenu", Dword(dword)),
        RegistryWrite::new(EXPLORER_ACCENT, "StartColorMenu", Dword(dword)),
        RegistryWrite::new(DWM, "ColorizationColor", Dword(dword)),
        RegistryWrite::new(CLASSIC_COLORS, "Hilight", RegistryValue::String(rgb.clone())),
        RegistryWrite::new(CLASSIC_COLORS, "HotTrackingColor", RegistryValue::String(rgb.clone())),
        RegistryWrite::new(CLASSIC_COLORS, "AccentColor", RegistryValue::String(rgb)),
    ]
    .into_iter()
    .collect()
}

/// Applies accent colors through a [`ConfigStoreWriter`].
///
/// Parsing happens before any side effect. There is no retry and no
/// read-back: the shell may pick values up asynchronously.
#[derive(Debug, Clone)]
pub struct ColorApplier<S> {
    store: S,
}

impl<S: ConfigStoreWriter> ColorApplier<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Parses `input` and writes the resulting accent color.
    ///
    /// The change broadcast is sent even if some writes failed, since the
    /// ones that landed are already visible to readers of the store.
    pub async fn apply(&self, input: &str) -> Result<ColorDescriptor, ApplyError> {
        let color = ColorDescriptor::parse(input)?;
        let encoding = RegistryEncoding::from(&color);
        let batch = accent_batch(&encoding);

        tracing::info!(%color, dword = encoding.dword_value, "applying accent color");

        let written = self.store.write_batch(&batch).await;
        let broadcast = self.store.broadcast_change().await;

        match (written, broadcast) {
            (Ok(()), Ok(())) => Ok(color),
            (Err(e), broadcast) => {
                if let Err(b) = broadcast {
                    tracing::warn!("change broadcast failed after write error: {b}");
                }
                Err(e.into())
            }
            (Ok(()), Err(e)) => Err(ApplyError::StoreWrite(e)),
        }
    }
}

impl ColorApplier<crate::reg::RegCommandStore> {
    /// An applier that writes through `reg.exe`.
    pub fn system() -> Self {
        Self::new(crate::reg::RegCommandStore::new())
    }
}
