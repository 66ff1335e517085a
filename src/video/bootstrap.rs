//!
//! The video driver registry.
//!
//! Drivers are kept in the order they were registered; selection walks the
//! list front to back.
//!

use std::fmt;

use crate::video::backend::VideoBackend;

/// Factory building a backend instance for a device index.
pub type CreateBackendFn = Box<dyn Fn(usize) -> Option<Box<dyn VideoBackend>> + Send + Sync>;

/// One registered video driver.
pub struct VideoBootstrap {
    pub name: &'static str,
    pub desc: &'static str,
    /// Whether the platform can run this driver right now.
    pub available: fn() -> bool,
    pub create: CreateBackendFn,
}

impl VideoBootstrap {
    pub fn new<F>(name: &'static str, desc: &'static str, available: fn() -> bool, create: F) -> Self
    where
        F: Fn(usize) -> Option<Box<dyn VideoBackend>> + Send + Sync + 'static,
    {
        Self {
            name,
            desc,
            available,
            create: Box::new(create),
        }
    }

    /// Whether a requested driver name selects this entry.
    ///
    /// Case-sensitive; either name may be a prefix of the other, so "x"
    /// selects "x11".
    #[must_use]
    pub fn matches(&self, requested: &str) -> bool {
        self.name.starts_with(requested) || requested.starts_with(self.name)
    }
}

impl fmt::Debug for VideoBootstrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoBootstrap")
            .field("name", &self.name)
            .field("desc", &self.desc)
            .finish_non_exhaustive()
    }
}

/// Ordered list of video drivers.
#[derive(Debug)]
pub struct DriverRegistry {
    drivers: Vec<VideoBootstrap>,
}

impl DriverRegistry {
    /// A registry with no drivers.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            drivers: Vec::new(),
        }
    }

    /// Append a driver; it is tried after every driver already listed.
    pub fn register(&mut self, driver: VideoBootstrap) -> &mut Self {
        self.drivers.push(driver);
        self
    }

    #[must_use]
    pub fn num_drivers(&self) -> usize {
        self.drivers.len()
    }

    #[must_use]
    pub fn driver_name(&self, index: usize) -> Option<&'static str> {
        self.drivers.get(index).map(|driver| driver.name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VideoBootstrap> {
        self.drivers.iter()
    }

    /// Build a backend.
    ///
    /// With a name, only the first matching entry is considered and its
    /// failure is final. Without one, the first available entry that
    /// constructs wins.
    pub(crate) fn select(
        &self,
        requested: Option<&str>,
        index: usize,
    ) -> Option<(&'static str, Box<dyn VideoBackend>)> {
        match requested {
            Some(name) => {
                let driver = self.drivers.iter().find(|driver| driver.matches(name))?;
                if !(driver.available)() {
                    return None;
                }
                (driver.create)(index).map(|backend| (driver.name, backend))
            }
            None => self.drivers.iter().find_map(|driver| {
                if (driver.available)() {
                    (driver.create)(index).map(|backend| (driver.name, backend))
                } else {
                    None
                }
            }),
        }
    }
}

impl Default for DriverRegistry {
    /// The drivers built into this crate.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(crate::backends::dummy::bootstrap());
        registry
    }
}
