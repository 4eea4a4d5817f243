use std::sync::OnceLock;

use mac_oui::Oui;
use netsurvey_common::vendors::VendorRepository;
use pnet::util::MacAddr;
use tracing::warn;

static OUI_DB: OnceLock<Option<Oui>> = OnceLock::new();

/// Loaded on first lookup; a database that fails to load disables vendor
/// resolution for the rest of the process.
fn oui_db() -> Option<&'static Oui> {
    OUI_DB
        .get_or_init(|| match Oui::default() {
            Ok(db) => Some(db),
            Err(e) => {
                warn!("failed to load OUI database: {e:?}");
                None
            }
        })
        .as_ref()
}

/// Vendor lookup against the IEEE registry bundled with `mac_oui`.
pub struct MacOuiRepo;

impl VendorRepository for MacOuiRepo {
    fn get_vendor(&self, mac: MacAddr) -> Option<String> {
        let db = oui_db()?;
        match db.lookup_by_mac(&mac.to_string()) {
            Ok(Some(entry)) => Some(entry.company_name.clone()),
            _ => None,
        }
    }
}
