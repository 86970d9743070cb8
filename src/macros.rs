// (c) Copyright 2025 Helsing GmbH. All rights reserved.
/// Convenience macro for creating [`MapData`](crate::MapData) literals.
///
/// Sections are optional but must appear in declaration order (`counters`,
/// `flags`, `registers`, `sets`, `maps`), each followed by a trailing
/// comma. Register values and set elements accept anything that converts
/// into a [`Blob`](crate::Blob).
///
/// ```rust
/// # use crmap::map_data;
/// let data = map_data! {
///     counters: { "visits" => 3 },
///     flags: { "active" => true },
///     registers: { "greeting" => "hello" },
///     sets: { "tags" => ["a", "b"] },
///     maps: {
///         "profile" => {
///             counters: { "logins" => 1 },
///         }
///     },
/// };
/// assert_eq!(data.counters["visits"], 3);
/// assert_eq!(data.maps["profile"].counters["logins"], 1);
/// ```
#[macro_export]
macro_rules! map_data {
    (
        $(counters: { $($ck:literal => $cv:expr),* $(,)? } $(,)?)?
        $(flags: { $($fk:literal => $fv:expr),* $(,)? } $(,)?)?
        $(registers: { $($rk:literal => $rv:expr),* $(,)? } $(,)?)?
        $(sets: { $($sk:literal => [$($se:expr),* $(,)?]),* $(,)? } $(,)?)?
        $(maps: { $($mk:literal => { $($inner:tt)* }),* $(,)? } $(,)?)?
    ) => {{
        #[allow(unused_mut)]
        let mut data = $crate::MapData::default();
        $($(data.counters.insert($ck.into(), $cv);)*)?
        $($(data.flags.insert($fk.into(), $fv);)*)?
        $($(data.registers.insert($rk.into(), $crate::Blob::from($rv));)*)?
        $($(data.sets.insert(
            $sk.into(),
            [$($crate::Blob::from($se)),*].into_iter().collect(),
        );)*)?
        $($(data.maps.insert($mk.into(), $crate::map_data! { $($inner)* });)*)?
        data
    }};
}
