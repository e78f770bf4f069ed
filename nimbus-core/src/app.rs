//! Watch-face application state
//!
//! `WatchFaceState` owns everything the face needs and is driven by three
//! kinds of events from the host: a tick once per minute, an inbound
//! message from the phone, and a transport failure. Each handler runs to
//! completion; there is no internal concurrency.
//!
//! ```text
//! tick ──▶ RefreshScheduler ──▶ SyncStore::send_request ──▶ Transport
//!
//! phone ──▶ SyncStore::apply_remote_update ──▶ WeatherPresenter
//!                                               ├─ icon ──▶ IconResourceManager ──▶ display
//!                                               └─ temperature ──▶ display
//! ```

use nimbus_protocol::{TupleValue, WeatherKey};

use crate::clock::{format_time, WallTime};
use crate::config::{ClockStyle, ConfigError, WatchFaceConfig};
use crate::icon::{icon_for_code, IconResourceManager, IconState};
use crate::scheduler::RefreshScheduler;
use crate::sync::{SyncError, SyncObserver, SyncStore};
use crate::traits::{
    AllocError, Feedback, ResourceId, ResourceLoader, Transport, TransportError, WeatherDisplay,
};

/// Errors the watch face cannot continue from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FatalError {
    /// Configuration rejected at startup
    Config(ConfigError),
    /// Initial dataset could not be stored
    Sync(SyncError),
    /// Icon bitmap could not be allocated
    ResourceAllocation(AllocError),
}

impl From<ConfigError> for FatalError {
    fn from(e: ConfigError) -> Self {
        FatalError::Config(e)
    }
}

impl From<SyncError> for FatalError {
    fn from(e: SyncError) -> Self {
        FatalError::Sync(e)
    }
}

impl From<AllocError> for FatalError {
    fn from(e: AllocError) -> Self {
        FatalError::ResourceAllocation(e)
    }
}

/// Observer that turns dataset changes into screen and haptic output
pub struct WeatherPresenter<L: ResourceLoader, D, F> {
    icons: IconResourceManager<L>,
    display: D,
    feedback: F,
}

impl<L, D, F> WeatherPresenter<L, D, F>
where
    L: ResourceLoader,
    D: WeatherDisplay<L::Bitmap>,
    F: Feedback,
{
    pub fn new(loader: L, display: D, feedback: F) -> Self {
        Self {
            icons: IconResourceManager::new(loader),
            display,
            feedback,
        }
    }

    pub fn icons(&self) -> &IconResourceManager<L> {
        &self.icons
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn feedback(&self) -> &F {
        &self.feedback
    }

    fn show_icon_code(&mut self, value: &TupleValue<'_>) -> Result<(), AllocError> {
        let code = value.as_integer().and_then(|c| u8::try_from(c).ok());
        let Some(id) = code.and_then(icon_for_code) else {
            warn!("No icon for code {:?}, keeping current", value.as_integer());
            return Ok(());
        };
        self.icons.set_icon(id)?;
        self.display.show_icon(self.icons.current_bitmap());
        Ok(())
    }

    fn release_icon(&mut self) {
        self.icons.clear();
        self.display.show_icon(None);
    }
}

impl<L, D, F> SyncObserver for WeatherPresenter<L, D, F>
where
    L: ResourceLoader,
    D: WeatherDisplay<L::Bitmap>,
    F: Feedback,
{
    type Error = FatalError;

    fn on_changed(
        &mut self,
        key: u32,
        new_value: &TupleValue<'_>,
        _old_value: &TupleValue<'_>,
    ) -> Result<(), FatalError> {
        self.feedback.short_pulse();

        match WeatherKey::from_u32(key) {
            Some(WeatherKey::Icon) => self.show_icon_code(new_value)?,
            Some(WeatherKey::Temperature) => match new_value.as_str() {
                Some(text) => self.display.show_temperature(text),
                None => warn!("Temperature is not text"),
            },
            _ => trace!("No presenter for key {}", key),
        }
        Ok(())
    }

    fn on_error(&mut self, error: SyncError) {
        warn!("Sync error: {:?}", error);
        self.feedback.long_pulse();
    }
}

/// The running watch face
pub struct WatchFaceState<T, L, D, F>
where
    L: ResourceLoader,
{
    sync: SyncStore<WeatherPresenter<L, D, F>>,
    transport: T,
    scheduler: RefreshScheduler,
    clock_style: ClockStyle,
}

impl<T, L, D, F> WatchFaceState<T, L, D, F>
where
    T: Transport,
    L: ResourceLoader,
    D: WeatherDisplay<L::Bitmap>,
    F: Feedback,
{
    /// Start the watch face
    ///
    /// Stores the initial dataset, shows it, and asks the phone for fresh
    /// weather if `request_on_start` is set.
    pub fn new(
        config: &WatchFaceConfig,
        transport: T,
        loader: L,
        display: D,
        feedback: F,
    ) -> Result<Self, FatalError> {
        config.validate()?;

        let presenter = WeatherPresenter::new(loader, display, feedback);
        let sync = SyncStore::new(&config.initial_tuples(), presenter)?;
        let mut state = Self {
            sync,
            transport,
            scheduler: RefreshScheduler::new(config.refresh_interval_minutes),
            clock_style: config.clock_style,
        };

        state.sync.announce_initial()?;
        info!(
            "Watch face started: refresh every {} min",
            state.scheduler.interval_minutes()
        );

        if config.request_on_start {
            state.request_weather_update();
        }
        Ok(state)
    }

    /// Minute tick from the clock
    ///
    /// Redraws the time and returns true if a forecast request was sent.
    pub fn on_minute_tick(&mut self, now: WallTime) -> bool {
        let text = format_time(now, self.clock_style);
        self.sync.observer_mut().display.show_time(&text);

        if self.scheduler.should_refresh(now.minute()) {
            debug!("Refresh due at minute {}", now.minute());
            self.request_weather_update()
        } else {
            false
        }
    }

    /// Ask the phone for fresh weather
    pub fn request_weather_update(&mut self) -> bool {
        self.sync.observer_mut().feedback.double_pulse();
        self.sync
            .send_request(&mut self.transport, WeatherKey::ForecastRequest, 1)
    }

    /// Dictionary received from the phone
    ///
    /// Returns the number of changed keys.
    pub fn on_message_received(&mut self, dictionary: &[u8]) -> Result<usize, FatalError> {
        self.sync.apply_remote_update(dictionary).map_err(|e| {
            error!("Fatal error applying update: {:?}", e);
            e
        })
    }

    /// The transport dropped an inbound message
    pub fn on_message_dropped(&mut self, error: TransportError) {
        self.sync.report_receive_error(error);
    }

    /// An outbound message failed after it was handed to the transport
    pub fn on_send_failed(&mut self, error: TransportError) {
        warn!("Outbound message failed: {:?}", error);
        self.sync.observer_mut().on_error(SyncError::Transport(error));
    }

    /// Release the icon bitmap
    pub fn shutdown(&mut self) {
        info!("Watch face stopping");
        self.sync.observer_mut().release_icon();
    }
}

impl<T, L, D, F> WatchFaceState<T, L, D, F>
where
    L: ResourceLoader,
{
    /// Temperature text currently stored
    pub fn temperature(&self) -> Option<&str> {
        self.sync
            .get(WeatherKey::Temperature)
            .and_then(|value| match value {
                TupleValue::CString(text) => Some(text),
                _ => None,
            })
    }

    pub fn icon_state(&self) -> IconState {
        self.sync.observer().icons.state()
    }

    pub fn current_icon(&self) -> ResourceId {
        self.sync.observer().icons.current_id()
    }

    pub fn sync(&self) -> &SyncStore<WeatherPresenter<L, D, F>> {
        &self.sync
    }

    pub fn presenter(&self) -> &WeatherPresenter<L, D, F> {
        self.sync.observer()
    }

    pub fn scheduler(&self) -> &RefreshScheduler {
        &self.scheduler
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}
