use embassy_time::Duration;

/// 定义按键模式识别的时间参数。
///
/// 这个结构体允许用户调整轮询周期、双击窗口和长按阈值。
/// 所有时间最终都以毫秒参与计算。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonConfig {
    /// 轮询周期。
    ///
    /// 两次采样之间至少间隔这么久；更频繁的 `poll` 调用不会产生任何效果。
    /// 消抖依赖于此：一次按下需要连续两个周期都被采到才会被确认。
    pub poll_interval: Duration,

    /// 双击的时间窗口，从第一次确认按下开始计算。
    ///
    /// 只有注册了双击回调时才生效。
    pub double_press_window: Duration,

    /// 触发长按所需的持续按住时间。
    ///
    /// 只有注册了长按回调时才生效。
    pub long_press_time: Duration,
}

impl ButtonConfig {
    pub(crate) fn poll_interval_ms(&self) -> u32 {
        as_millis(self.poll_interval)
    }

    pub(crate) fn double_press_window_ms(&self) -> u32 {
        as_millis(self.double_press_window)
    }

    pub(crate) fn long_press_time_ms(&self) -> u32 {
        as_millis(self.long_press_time)
    }
}

impl Default for ButtonConfig {
    /// 提供一套合理的默认配置。
    ///
    /// - 轮询周期: 20ms
    /// - 双击窗口: 300ms
    /// - 长按阈值: 3000ms
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(20),
            double_press_window: Duration::from_millis(300),
            long_press_time: Duration::from_millis(3000),
        }
    }
}

pub(crate) fn as_millis(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}
