//! Display collaborator
//!
//! Layout and rendering live outside the core. The watch face only tells
//! the display what to show.

/// Trait for the watch-face screen
///
/// `B` is the bitmap handle type of the resource loader in use.
pub trait WeatherDisplay<B> {
    /// Show the weather icon, or nothing
    fn show_icon(&mut self, bitmap: Option<&B>);

    /// Show the temperature text (already carries its unit)
    fn show_temperature(&mut self, text: &str);

    /// Show the time text
    fn show_time(&mut self, text: &str);
}
