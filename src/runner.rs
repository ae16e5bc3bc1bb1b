use std::io;
use std::time::{Duration, Instant};

use crate::app::App;
use crate::drivers::{InputDriver, OutputDriver};
use crate::event_loop::{ControlFlow, EventLoop};

/// Drive `app` until it asks to quit.
///
/// Each tick drains worker results and redraws; each input event is routed
/// through [`App::handle_event`]. Mouse capture changes requested by the app
/// are applied to the input driver after every step.
pub fn run_app<O, D>(
    output: &mut O,
    driver: D,
    app: &mut App,
    poll_interval: Duration,
) -> io::Result<()>
where
    O: OutputDriver,
    D: InputDriver,
{
    let mut event_loop = EventLoop::new(driver, poll_interval);
    event_loop
        .driver()
        .set_mouse_capture(app.mouse_capture_enabled())?;

    event_loop.run(|driver, event| {
        let flow = match event {
            Some(event) => app.handle_event(&event),
            None => {
                app.tick(Instant::now());
                output.draw(|mut frame| app.render(&mut frame))?;
                ControlFlow::Continue
            }
        };
        if let Some(enabled) = app.take_mouse_capture_change() {
            if let Err(err) = driver.set_mouse_capture(enabled) {
                tracing::warn!(%err, enabled, "cannot change mouse capture");
            }
        }
        Ok(flow)
    })
}
