#![no_std]

#[macro_use]
mod fmt;

pub mod adc;
pub mod adc_keypad;
pub mod config;
pub mod gpio;
pub mod time;

pub use config::*;
pub use gpio::{ActiveLevel, NoPin};
pub use time::{Clock, EmbassyClock};

use embassy_time::{Duration, Ticker};
use embedded_hal::digital::InputPin;

use crate::time::elapsed;

/// 按键识别出的高级模式。
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressPattern {
    SinglePress,
    DoublePress,
    LongPress,
}

/// 模式回调。参数为触发回调的按钮与识别出的模式。
pub type Callback<P> = fn(&Button<P>, PressPattern);

/// 由 [`AdcKeypad`](adc_keypad::AdcKeypad) 驱动的从属按钮。
pub type SlaveButton = Button<NoPin>;

/// 按钮的原始信号来源。
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonMode {
    /// 按钮自己读取数字引脚。
    Standalone,
    /// 原始信号由所属的按键阵列推送。
    Slave,
}

enum Source<P> {
    Standalone {
        pin: P,
        active_level: ActiveLevel,
        last_poll: Option<u32>,
    },
    Slave,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct PressState {
    previous: bool,
    current: bool,
    debouncing: bool,
    taps: u8,
    first_tap_at: Option<u32>,
    held_since: Option<u32>,
}

struct Callbacks<P> {
    single: Option<Callback<P>>,
    double: Option<Callback<P>>,
    long: Option<Callback<P>>,
}

impl<P> Default for Callbacks<P> {
    fn default() -> Self {
        Self {
            single: None,
            double: None,
            long: None,
        }
    }
}

/// 轮询驱动的按键模式识别器。
///
/// 每个物理按键对应一个 `Button`。它在固定的轮询周期内接收一次原始的
/// “是否按下”信号，经过消抖后识别单击、双击和长按。
///
/// 单击的判定会被推迟，直到可以确定不会再出现双击或长按为止；
/// 同时满足长按和双击条件时，长按优先。
pub struct Button<P> {
    id: u8,
    source: Source<P>,
    config: ButtonConfig,
    state: PressState,
    callbacks: Callbacks<P>,
}

impl Button<NoPin> {
    /// 创建一个从属按钮，`id` 即它在按键阵列中的槽位。
    pub fn slave(id: u8) -> Self {
        Self::with_source(id, Source::Slave)
    }
}

impl<P: InputPin> Button<P> {
    /// 创建一个直接读取GPIO引脚的独立按钮。
    ///
    /// # 参数
    /// * `id`: 按钮标识，通常是引脚号。
    /// * `pin`: 一个实现了 `InputPin` 的GPIO引脚，上拉/下拉需由调用方预先配置。
    /// * `active_level`: 按钮按下时的有效电平。
    pub fn standalone(id: u8, pin: P, active_level: ActiveLevel) -> Self {
        Self::with_source(
            id,
            Source::Standalone {
                pin,
                active_level,
                last_poll: None,
            },
        )
    }

    /// 用给定时钟轮询按钮，见 [`Button::poll_at`]。
    pub fn poll<C: Clock>(&mut self, clock: &C) -> Option<PressPattern> {
        self.poll_at(clock.now_ms())
    }

    /// 距离上次采样超过轮询周期时读取引脚并推进状态机，否则什么也不做。
    ///
    /// 第一次调用总会采样。返回本周期交付给回调的模式。
    pub fn poll_at(&mut self, now: u32) -> Option<PressPattern> {
        if let Source::Standalone {
            last_poll: Some(last),
            ..
        } = self.source
        {
            if elapsed(now, last) < self.config.poll_interval_ms() {
                return None;
            }
        }
        self.sample(now)
    }

    /// 在 embassy 任务中以轮询周期持续驱动按钮，时间戳取自 `clock`。
    pub async fn run<C: Clock>(&mut self, clock: &C) -> ! {
        let mut ticker = Ticker::every(self.config.poll_interval);
        loop {
            self.sample(clock.now_ms());
            ticker.next().await;
        }
    }

    fn sample(&mut self, now: u32) -> Option<PressPattern> {
        let actuated = match &mut self.source {
            Source::Standalone {
                pin,
                active_level,
                last_poll,
            } => {
                *last_poll = Some(now);
                active_level.is_active(pin)
            }
            Source::Slave => return None,
        };
        self.advance(actuated, now)
    }
}

impl<P> Button<P> {
    fn with_source(id: u8, source: Source<P>) -> Self {
        Self {
            id,
            source,
            config: ButtonConfig::default(),
            state: PressState::default(),
            callbacks: Callbacks::default(),
        }
    }

    /// 以给定配置替换默认配置，用于构造时链式调用。
    pub fn with_config(mut self, config: ButtonConfig) -> Self {
        self.config = config;
        self
    }

    /// 注册单击回调。
    pub fn on_press(&mut self, callback: Callback<P>) -> &mut Self {
        self.callbacks.single = Some(callback);
        self
    }

    /// 注册双击回调，沿用当前配置的双击窗口。
    pub fn on_double_press(&mut self, callback: Callback<P>) -> &mut Self {
        self.callbacks.double = Some(callback);
        self
    }

    /// 注册双击回调并覆盖双击窗口。
    pub fn on_double_press_within(
        &mut self,
        callback: Callback<P>,
        window: Duration,
    ) -> &mut Self {
        self.config.double_press_window = window;
        self.on_double_press(callback)
    }

    /// 注册长按回调，沿用当前配置的长按阈值。
    pub fn on_long_press(&mut self, callback: Callback<P>) -> &mut Self {
        self.callbacks.long = Some(callback);
        self
    }

    /// 注册长按回调并覆盖长按阈值。
    pub fn on_press_for(&mut self, callback: Callback<P>, timeout: Duration) -> &mut Self {
        self.config.long_press_time = timeout;
        self.on_long_press(callback)
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn mode(&self) -> ButtonMode {
        match self.source {
            Source::Standalone { .. } => ButtonMode::Standalone,
            Source::Slave => ButtonMode::Slave,
        }
    }

    pub fn config(&self) -> &ButtonConfig {
        &self.config
    }

    pub fn set_config(&mut self, new_config: ButtonConfig) {
        self.config = new_config;
    }

    /// 最近一个周期的原始信号（未消抖）。
    pub fn is_pressed(&self) -> bool {
        self.state.current
    }

    /// 当前连击序列中已确认的按下次数。
    pub fn tap_count(&self) -> u8 {
        self.state.taps
    }

    /// 获取底层引脚的不可变引用，从属按钮返回 `None`。
    pub fn pin(&self) -> Option<&P> {
        match &self.source {
            Source::Standalone { pin, .. } => Some(pin),
            Source::Slave => None,
        }
    }

    /// 获取底层引脚的可变引用，从属按钮返回 `None`。
    pub fn pin_mut(&mut self) -> Option<&mut P> {
        match &mut self.source {
            Source::Standalone { pin, .. } => Some(pin),
            Source::Slave => None,
        }
    }

    /// 重置按钮状态到初始空闲状态，保留配置与回调。
    pub fn reset(&mut self) {
        self.state = PressState::default();
        if let Source::Standalone { last_poll, .. } = &mut self.source {
            *last_poll = None;
        }
    }

    /// 推进一个周期的状态机。
    ///
    /// 独立按钮由 [`Button::poll`] 调用，从属按钮由所属阵列调用；
    /// 调用方需保证每个轮询周期最多调用一次。
    /// 返回本周期交付给回调的模式，没有注册回调的模式不会被返回。
    pub fn advance(&mut self, actuated: bool, now: u32) -> Option<PressPattern> {
        self.state.previous = self.state.current;
        self.state.current = actuated;

        // 上升沿只做标记，下一个周期仍为按下才算确认
        if !self.state.previous && self.state.current {
            self.state.debouncing = true;
            trace!("button {}: debouncing", self.id);
            return None;
        }

        let mut delivered = None;

        if self.state.taps > 0 && !self.double_press_possible(now) && !self.long_press_possible() {
            delivered = self.deliver(self.callbacks.single, PressPattern::SinglePress);
            self.state.taps = 0;
            self.state.first_tap_at = None;
        }

        if self.state.previous && self.state.current {
            if self.state.debouncing {
                self.state.debouncing = false;
                self.state.taps = self.state.taps.saturating_add(1);
                self.state.first_tap_at.get_or_insert(now);
                self.state.held_since.get_or_insert(now);
                trace!("button {}: tap {}", self.id, self.state.taps);
            }

            let long_press_time = self.config.long_press_time_ms();
            if self.callbacks.long.is_some()
                && self.state.taps > 0
                && self
                    .state
                    .held_since
                    .is_some_and(|since| elapsed(now, since) >= long_press_time)
            {
                let delivered = self.deliver(self.callbacks.long, PressPattern::LongPress);
                self.state.taps = 0;
                self.state.first_tap_at = None;
                self.state.held_since = None;
                return delivered;
            }

            if self.callbacks.double.is_some()
                && self.state.taps > 1
                && self.within_double_press_window(now)
            {
                let delivered = self.deliver(self.callbacks.double, PressPattern::DoublePress);
                self.state.taps = 0;
                self.state.first_tap_at = None;
                return delivered;
            }
        }

        if self.state.previous && !self.state.current {
            self.state.held_since = None;
        }

        delivered
    }

    fn within_double_press_window(&self, now: u32) -> bool {
        let window = self.config.double_press_window_ms();
        self.state
            .first_tap_at
            .is_some_and(|first| elapsed(now, first) <= window)
    }

    fn double_press_possible(&self, now: u32) -> bool {
        self.callbacks.double.is_some() && self.within_double_press_window(now)
    }

    fn long_press_possible(&self) -> bool {
        self.callbacks.long.is_some() && self.state.held_since.is_some() && self.state.current
    }

    fn deliver(
        &self,
        callback: Option<Callback<P>>,
        pattern: PressPattern,
    ) -> Option<PressPattern> {
        debug!("button {}: {}", self.id, pattern);
        let callback = callback?;
        callback(self, pattern);
        Some(pattern)
    }
}
