//! 电阻分压式ADC按键阵列。
//!
//! 多个按键共用一路模拟输入，每个按键按下时产生一段不同的电压。
//! [`AdcKeypad`] 每个周期采样一次，找出读数落在哪个按键的电压区间内，
//! 再把“按下/未按下”推送给它拥有的每一个从属按钮。

use embassy_time::{Duration, Ticker};

use crate::{
    adc::{filter::AverageFilter, AdcFilter, AnalogInput},
    config::as_millis,
    time::{elapsed, Clock},
    ButtonConfig, SlaveButton,
};

/// 预筛选的下限。
///
/// 预筛选条件是 `level >= NOISE_FLOOR || level < 满量程`，对满量程以内的读数恒成立，
/// 因此低读数并不会被单独滤掉，最终仍由各按键的区间决定。
pub const NOISE_FLOOR: u16 = 100;

/// 默认的ADC满量程（10位ADC）。
pub const DEFAULT_ADC_RESOLUTION: u16 = 1024;

/// 默认每个周期取平均的采样次数。
pub const DEFAULT_SAMPLES: usize = 4;

/// 一个按键对应的电压读数区间，上下界均不包含。
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoltageBand {
    pub lower: u16,
    pub upper: u16,
}

impl VoltageBand {
    pub const fn new(lower: u16, upper: u16) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, level: u16) -> bool {
        level > self.lower && level < self.upper
    }
}

struct Slot {
    button: SlaveButton,
    band: VoltageBand,
}

/// 拥有 `N` 个从属按钮的ADC按键阵列。
///
/// 区间允许重叠，此时编号最小的按键优先；任何区间都不包含的读数等同于全部松开。
pub struct AdcKeypad<
    A: AnalogInput,
    const N: usize,
    F: AdcFilter = AverageFilter<DEFAULT_SAMPLES>,
> {
    adc: A,
    filter: F,
    slots: [Option<Slot>; N],
    adc_resolution: u16,
    poll_interval: Duration,
    last_poll: Option<u32>,
}

impl<A: AnalogInput, const N: usize> AdcKeypad<A, N> {
    /// 创建一个使用默认均值滤波（4次采样）的按键阵列。
    pub fn new(adc: A) -> Self {
        Self::with_filter(adc, AverageFilter::new())
    }
}

impl<A: AnalogInput, const N: usize, F: AdcFilter> AdcKeypad<A, N, F> {
    pub fn with_filter(adc: A, filter: F) -> Self {
        Self {
            adc,
            filter,
            slots: core::array::from_fn(|_| None),
            adc_resolution: DEFAULT_ADC_RESOLUTION,
            poll_interval: ButtonConfig::default().poll_interval,
            last_poll: None,
        }
    }

    /// 设置ADC满量程，例如 ESP32 的12位ADC为 4096。
    pub fn set_adc_resolution(&mut self, resolution: u16) -> &mut Self {
        self.adc_resolution = resolution;
        self
    }

    pub fn adc_resolution(&self) -> u16 {
        self.adc_resolution
    }

    /// 设置阵列的采样周期，默认 20ms。
    ///
    /// 双击窗口与长按阈值属于各个按钮，通过 [`AdcKeypad::button_mut`] 配置。
    pub fn set_poll_interval(&mut self, interval: Duration) -> &mut Self {
        self.poll_interval = interval;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// 将从属按钮放入与其 `id` 相同的槽位，并记录它的电压区间。
    ///
    /// 同一槽位重复添加时，后添加的按钮替换先前的。
    pub fn add_button(&mut self, button: SlaveButton, lower: u16, upper: u16) -> &mut Self {
        let index = usize::from(button.id());
        assert!(index < N, "Button ID must be less than the keypad size");
        self.slots[index] = Some(Slot {
            button,
            band: VoltageBand::new(lower, upper),
        });
        self
    }

    pub fn button(&self, id: u8) -> Option<&SlaveButton> {
        self.slots
            .get(usize::from(id))?
            .as_ref()
            .map(|slot| &slot.button)
    }

    /// 获取槽位中的按钮，用于在添加之后继续注册回调。
    pub fn button_mut(&mut self, id: u8) -> Option<&mut SlaveButton> {
        self.slots
            .get_mut(usize::from(id))?
            .as_mut()
            .map(|slot| &mut slot.button)
    }

    pub fn band(&self, id: u8) -> Option<VoltageBand> {
        self.slots.get(usize::from(id))?.as_ref().map(|slot| slot.band)
    }

    /// 丢弃一次转换结果，让ADC在第一次正式采样前稳定下来。
    pub fn begin(&mut self) {
        if self.adc.read().is_err() {
            warn!("adc keypad: warm-up read failed");
        }
    }

    /// 读取经过滤波的电压读数，可用于标定各按键的区间。
    pub fn read_level(&mut self) -> Result<u16, A::Error> {
        loop {
            let sample = match self.adc.read() {
                Ok(sample) => sample,
                Err(e) => {
                    self.filter.reset();
                    return Err(e);
                }
            };
            if let Some(level) = self.filter.process(sample) {
                debug!("adc keypad: level {}", level);
                return Ok(level);
            }
        }
    }

    /// 返回读数对应的按键编号，没有匹配时返回 `None`。
    pub fn classify(&self, level: u16) -> Option<u8> {
        if !(level >= NOISE_FLOOR || level < self.adc_resolution) {
            return None;
        }
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|slot| slot.band.contains(level)))
            .map(|index| index as u8)
    }

    /// 用给定时钟轮询阵列，见 [`AdcKeypad::poll_at`]。
    pub fn poll<C: Clock>(&mut self, clock: &C) -> bool {
        self.poll_at(clock.now_ms())
    }

    /// 距离上次采样超过轮询周期时采样并驱动所有按钮，返回本次是否执行了采样。
    pub fn poll_at(&mut self, now: u32) -> bool {
        if let Some(last) = self.last_poll {
            if elapsed(now, last) < as_millis(self.poll_interval) {
                return false;
            }
        }
        self.sample(now);
        true
    }

    /// 在 embassy 任务中以轮询周期持续驱动整个阵列，时间戳取自 `clock`。
    pub async fn run<C: Clock>(&mut self, clock: &C) -> ! {
        let mut ticker = Ticker::every(self.poll_interval);
        loop {
            self.sample(clock.now_ms());
            ticker.next().await;
        }
    }

    fn sample(&mut self, now: u32) {
        self.last_poll = Some(now);

        let level = match self.read_level() {
            Ok(level) => level,
            Err(_) => {
                warn!("adc keypad: read failed, cycle skipped");
                return;
            }
        };

        let pressed = self.classify(level);
        trace!("adc keypad: level {} -> {}", level, pressed);

        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(slot) = slot {
                let actuated = pressed == Some(index as u8);
                slot.button.advance(actuated, now);
            }
        }
    }

    /// 获取底层ADC的不可变引用
    pub fn adc(&self) -> &A {
        &self.adc
    }

    /// 获取底层ADC的可变引用
    pub fn adc_mut(&mut self) -> &mut A {
        &mut self.adc
    }
}
