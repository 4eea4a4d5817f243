use pnet::util::MacAddr;

/// Defines the contract for resolving device manufacturers from MAC addresses.
pub trait VendorRepository: Send + Sync {
    /// Retrieves the vendor name for a given MAC address.
    ///
    /// # Returns
    /// * `Some(String)` - The name of the vendor if found.
    /// * `None` - If the OUI is unknown.
    fn get_vendor(&self, mac_addr: MacAddr) -> Option<String>;
}

/// A repository that knows no vendors.
pub struct NoVendors;

impl VendorRepository for NoVendors {
    fn get_vendor(&self, _mac_addr: MacAddr) -> Option<String> {
        None
    }
}

/// Formats the OUI prefix of `mac` as `"AA:BB:CC"`.
pub fn oui_prefix(mac: MacAddr) -> String {
    format!("{:02X}:{:02X}:{:02X}", mac.0, mac.1, mac.2)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
