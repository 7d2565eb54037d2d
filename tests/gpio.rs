use core::convert::Infallible;
use embassy_time::{Duration, Timer};
use embedded_hal::digital::ErrorKind;
use press_pattern::{ActiveLevel, Button, ButtonMode, Clock, EmbassyClock, PressPattern};
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

// --- Mock Hardware (模拟硬件) ---

/// 模拟GPIO引脚，电平由测试通过共享的 `AtomicBool` 控制（true 为高电平）。
#[derive(Clone)]
struct MockPin {
    level: Arc<AtomicBool>,
}

impl MockPin {
    fn new(high: bool) -> Self {
        Self {
            level: Arc::new(AtomicBool::new(high)),
        }
    }

    fn set_high(&self, high: bool) {
        self.level.store(high, Ordering::SeqCst);
    }
}

impl embedded_hal::digital::ErrorType for MockPin {
    type Error = Infallible;
}

impl embedded_hal::digital::InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level.load(Ordering::SeqCst))
    }
    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level.load(Ordering::SeqCst))
    }
}

/// 永远读取失败的引脚。
struct BrokenPin;

impl embedded_hal::digital::ErrorType for BrokenPin {
    type Error = ErrorKind;
}

impl embedded_hal::digital::InputPin for BrokenPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Err(ErrorKind::Other)
    }
    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Err(ErrorKind::Other)
    }
}

fn ignore(_button: &Button<MockPin>, _pattern: PressPattern) {}

#[test]
fn active_low_button_reads_low_as_pressed() {
    let pin = MockPin::new(true);
    let mut button = Button::standalone(4, pin.clone(), ActiveLevel::Low);

    button.poll_at(0);
    assert!(!button.is_pressed());

    pin.set_high(false);
    button.poll_at(20);
    assert!(button.is_pressed());
    button.poll_at(40);
    assert_eq!(button.tap_count(), 1);
}

#[test]
fn active_high_button_reads_high_as_pressed() {
    let pin = MockPin::new(false);
    let mut button = Button::standalone(5, pin.clone(), ActiveLevel::High);

    button.poll_at(0);
    assert!(!button.is_pressed());

    pin.set_high(true);
    button.poll_at(20);
    assert!(button.is_pressed());
}

#[test]
fn polls_within_interval_are_ignored() {
    let pin = MockPin::new(false);
    let mut button = Button::standalone(0, pin, ActiveLevel::Low);
    button.on_double_press(ignore);

    // 第一次调用总会采样：进入消抖
    button.poll_at(1000);
    assert!(button.is_pressed());
    assert_eq!(button.tap_count(), 0);

    // 周期内的调用不会确认按下
    for now in [1001, 1005, 1019] {
        assert_eq!(button.poll_at(now), None);
        assert_eq!(button.tap_count(), 0);
    }

    button.poll_at(1020);
    assert_eq!(button.tap_count(), 1);
}

#[test]
fn throttling_survives_clock_wrap() {
    let pin = MockPin::new(false);
    let mut button = Button::standalone(0, pin, ActiveLevel::Low);
    button.on_double_press(ignore);

    button.poll_at(u32::MAX - 5);
    button.poll_at(10);
    assert_eq!(button.tap_count(), 0);

    button.poll_at(14);
    assert_eq!(button.tap_count(), 1);
}

#[test]
fn failed_reads_count_as_released() {
    let mut button = Button::standalone(9, BrokenPin, ActiveLevel::Low);

    for now in (0..1000).step_by(20) {
        assert_eq!(button.poll_at(now), None);
    }
    assert!(!button.is_pressed());
    assert_eq!(button.tap_count(), 0);
}

#[test]
fn poll_with_injected_clock() {
    let pin = MockPin::new(true);
    let mut button = Button::standalone(2, pin.clone(), ActiveLevel::Low);
    button.on_press(ignore);

    let now = Cell::new(0u32);
    let clock = || now.get();

    let mut delivered = Vec::new();
    pin.set_high(false);
    for _ in 0..3 {
        now.set(now.get() + 20);
        delivered.extend(button.poll(&clock));
    }
    assert_eq!(delivered, vec![PressPattern::SinglePress]);
}

#[test]
fn mode_and_pin_accessors() {
    let pin = MockPin::new(true);
    let mut standalone = Button::standalone(12, pin, ActiveLevel::Low);
    assert_eq!(standalone.id(), 12);
    assert_eq!(standalone.mode(), ButtonMode::Standalone);
    assert!(standalone.pin().is_some());
    assert!(standalone.pin_mut().is_some());

    let slave = Button::slave(1);
    assert_eq!(slave.mode(), ButtonMode::Slave);
    assert!(slave.pin().is_none());
}

#[test]
fn embassy_clock_is_monotonic() {
    let first = EmbassyClock.now_ms();
    let second = EmbassyClock.now_ms();
    assert!(second.wrapping_sub(first) < 1000);
}

// --- 异步驱动 ---

static RUN_SINGLE_PRESSES: AtomicUsize = AtomicUsize::new(0);

fn count_single(_button: &Button<MockPin>, pattern: PressPattern) {
    if pattern == PressPattern::SinglePress {
        RUN_SINGLE_PRESSES.fetch_add(1, Ordering::SeqCst);
    }
}

async fn tap(pin: MockPin) {
    pin.set_high(true); // 初始状态
    Timer::after(Duration::from_millis(100)).await;

    pin.set_high(false);
    Timer::after(Duration::from_millis(100)).await;
    pin.set_high(true);
    Timer::after(Duration::from_millis(200)).await;
}

#[tokio::test]
async fn run_drives_button_from_ticker() {
    let pin = MockPin::new(true);
    let mut button = Button::standalone(0, pin.clone(), ActiveLevel::Low);
    button.on_press(count_single);

    let clock = EmbassyClock;
    let runner = embassy_time::with_timeout(Duration::from_millis(800), button.run(&clock));
    let (timed_out, _) = tokio::join!(runner, tap(pin));

    assert!(timed_out.is_err());
    assert_eq!(RUN_SINGLE_PRESSES.load(Ordering::SeqCst), 1);
}
