//! Ownership of the graphics device across losses.

/// Holds the current device and recreates it lazily after a loss.
pub struct DeviceSlot<B> {
    device: Option<B>,
    /// The last creation attempt failed.
    retrying: bool,
}

impl<B> Default for DeviceSlot<B> {
    fn default() -> Self {
        Self {
            device: None,
            retrying: false,
        }
    }
}

impl<B> DeviceSlot<B> {
    /// Installs a device created outside the slot, e.g. at startup.
    pub fn install(&mut self, device: B) {
        self.device = Some(device);
        self.retrying = false;
    }

    /// Returns the device, creating it first when there is none. A failed
    /// creation is logged and tried again on the next call; `on_created`
    /// runs once per new device.
    pub fn get_or_create(
        &mut self,
        create: impl FnOnce() -> anyhow::Result<B>,
        on_created: impl FnOnce(),
    ) -> Option<&mut B> {
        if self.device.is_none() {
            match create() {
                Ok(device) => {
                    if self.retrying {
                        log::info!("graphics device recreated");
                    }
                    on_created();
                    self.install(device);
                }
                Err(e) => {
                    if self.retrying {
                        log::debug!("graphics device still unavailable: {e:#}");
                    } else {
                        log::warn!("cannot create graphics device, retrying: {e:#}");
                    }
                    self.retrying = true;
                    return None;
                }
            }
        }
        self.device.as_mut()
    }

    pub fn get_mut(&mut self) -> Option<&mut B> {
        self.device.as_mut()
    }

    /// Forgets the device; the next [`get_or_create`](Self::get_or_create)
    /// builds a new one.
    pub fn drop_device(&mut self) {
        self.device = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_recreation_is_retried_next_time() {
        let mut slot = DeviceSlot::default();
        slot.install(1u32);
        slot.drop_device();

        let mut created = 0;
        let first = slot.get_or_create(|| Err(anyhow::anyhow!("adapter busy")), || created += 1);
        assert!(first.is_none());
        assert_eq!(created, 0);

        let second = slot.get_or_create(|| Ok(2), || created += 1).copied();
        assert_eq!(second, Some(2));
        assert_eq!(created, 1);
    }

    #[test]
    fn existing_device_is_not_rebuilt() {
        let mut slot = DeviceSlot::default();
        slot.install(7u32);
        let device = slot.get_or_create(|| panic!("must not create"), || panic!("not new"));
        assert_eq!(device.copied(), Some(7));
    }
}
