use embassy_time::Instant;

/// 单调递增的毫秒时钟。
///
/// 返回值允许溢出回绕，库内部所有的时间差都用 `wrapping_sub` 计算。
pub trait Clock {
    fn now_ms(&self) -> u32;
}

impl<F> Clock for F
where
    F: Fn() -> u32,
{
    fn now_ms(&self) -> u32 {
        self()
    }
}

/// 基于 `embassy_time::Instant` 的时钟，需要平台提供 embassy 时间驱动。
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u32 {
        // 截断到 u32 即可，时间差按回绕计算
        Instant::now().as_millis() as u32
    }
}

pub(crate) fn elapsed(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}
