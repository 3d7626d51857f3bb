//! USB device lookup and interface ownership
//!
//! This module finds the peer by VID:PID, picks the bulk endpoints of its
//! interface and wraps the opened handle in a [`UsbLink`] that releases the
//! interface when dropped.

use rusb::{Context, Device, DeviceHandle, Direction, TransferType, UsbContext};
use tracing::{debug, info, warn};

/// Interface and bulk endpoint addresses used by a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoints {
    pub interface: u8,
    pub alt_setting: u8,
    pub bulk_in: u8,
    pub bulk_out: u8,
}

/// Find the first attached device matching `vendor_id:product_id`
pub fn find_device(
    context: &Context,
    vendor_id: u16,
    product_id: u16,
) -> Result<Device<Context>, rusb::Error> {
    for device in context.devices()?.iter() {
        let descriptor = match device.device_descriptor() {
            Ok(descriptor) => descriptor,
            Err(e) => {
                debug!(
                    "Skipping device on bus {} addr {}: {}",
                    device.bus_number(),
                    device.address(),
                    e
                );
                continue;
            }
        };

        if descriptor.vendor_id() == vendor_id && descriptor.product_id() == product_id {
            info!(
                "Found device {:04x}:{:04x} on bus {:03} device {:03}",
                vendor_id,
                product_id,
                device.bus_number(),
                device.address()
            );
            return Ok(device);
        }
    }

    Err(rusb::Error::NotFound)
}

/// Pick the first interface setting exposing one bulk IN and one bulk OUT endpoint
///
/// When `interface` is given only that interface number is considered.
pub fn resolve_endpoints(
    device: &Device<Context>,
    interface: Option<u8>,
) -> Result<Endpoints, rusb::Error> {
    let config = device.active_config_descriptor()?;

    for iface in config.interfaces() {
        if interface.is_some_and(|wanted| wanted != iface.number()) {
            continue;
        }

        for setting in iface.descriptors() {
            let mut bulk_in = None;
            let mut bulk_out = None;

            for endpoint in setting.endpoint_descriptors() {
                if endpoint.transfer_type() != TransferType::Bulk {
                    continue;
                }
                match endpoint.direction() {
                    Direction::In => {
                        bulk_in.get_or_insert(endpoint.address());
                    }
                    Direction::Out => {
                        bulk_out.get_or_insert(endpoint.address());
                    }
                }
            }

            if let (Some(bulk_in), Some(bulk_out)) = (bulk_in, bulk_out) {
                let endpoints = Endpoints {
                    interface: setting.interface_number(),
                    alt_setting: setting.setting_number(),
                    bulk_in,
                    bulk_out,
                };
                debug!(
                    "Using interface {} (alt {}): IN {:#04x}, OUT {:#04x}",
                    endpoints.interface, endpoints.alt_setting, bulk_in, bulk_out
                );
                return Ok(endpoints);
            }
        }
    }

    Err(rusb::Error::NotFound)
}

/// Opened device with one claimed interface
///
/// Dropping the link releases the interface, hands it back to the kernel
/// driver if one was detached, and closes the handle.
pub struct UsbLink {
    pub(super) handle: DeviceHandle<Context>,
    pub(super) endpoints: Endpoints,
    detached_kernel_driver: bool,
}

impl UsbLink {
    /// Open `device` and claim the interface named by `endpoints`
    pub fn open(device: &Device<Context>, endpoints: Endpoints) -> Result<Self, rusb::Error> {
        let handle = device.open()?;
        let interface = endpoints.interface;

        let detached_kernel_driver = match handle.kernel_driver_active(interface) {
            Ok(true) => {
                debug!("Detaching kernel driver from interface {}", interface);
                handle.detach_kernel_driver(interface)?;
                true
            }
            Ok(false) => false,
            Err(e) => {
                debug!(
                    "Could not check kernel driver status for interface {}: {}",
                    interface, e
                );
                false
            }
        };

        if let Err(e) = claim(&handle, &endpoints) {
            warn!("Failed to claim interface {}: {}", interface, e);
            if detached_kernel_driver {
                let _ = handle.attach_kernel_driver(interface);
            }
            return Err(e);
        }

        info!("Claimed interface {}", interface);
        Ok(Self {
            handle,
            endpoints,
            detached_kernel_driver,
        })
    }

    pub fn endpoints(&self) -> Endpoints {
        self.endpoints
    }
}

fn claim(handle: &DeviceHandle<Context>, endpoints: &Endpoints) -> Result<(), rusb::Error> {
    handle.claim_interface(endpoints.interface)?;
    if endpoints.alt_setting != 0 {
        if let Err(e) = handle.set_alternate_setting(endpoints.interface, endpoints.alt_setting) {
            let _ = handle.release_interface(endpoints.interface);
            return Err(e);
        }
    }
    Ok(())
}

impl Drop for UsbLink {
    fn drop(&mut self) {
        let interface = self.endpoints.interface;

        if let Err(e) = self.handle.release_interface(interface) {
            warn!("Failed to release interface {}: {}", interface, e);
        }

        if self.detached_kernel_driver {
            if let Err(e) = self.handle.attach_kernel_driver(interface) {
                debug!(
                    "Could not reattach kernel driver to interface {}: {}",
                    interface, e
                );
            }
        }

        info!("Released interface {} and closed device", interface);
    }
}
