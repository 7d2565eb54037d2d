use embedded_hal::digital::InputPin;

/// 定义GPIO按钮的有效电平。
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ActiveLevel {
    /// 低电平有效（例如，使用上拉电阻，按下时引脚接地）。
    #[default]
    Low,
    /// 高电平有效（例如，使用下拉电阻，按下时引脚接VCC）。
    High,
}

impl ActiveLevel {
    /// 读取引脚电平并判断按键当前是否处于按下状态。
    ///
    /// 读取失败按“未按下”处理。
    pub fn is_active<P: InputPin>(self, pin: &mut P) -> bool {
        match self {
            ActiveLevel::Low => pin.is_low().unwrap_or(false),
            ActiveLevel::High => pin.is_high().unwrap_or(false),
        }
    }
}

/// 从属按钮的占位引脚类型。
///
/// 从属按钮不直接读取硬件，它的原始信号由 [`AdcKeypad`](crate::adc_keypad::AdcKeypad) 推送。
/// `NoPin` 没有实现 `InputPin`，因此无法用它构造独立按钮。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoPin;
