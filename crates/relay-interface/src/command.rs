/// Remote control commands understood by the prompter host.
///
/// On the wire these travel as `{"t":"cmd","cmd":"nextSentence"}`. The relay
/// forwards the string untouched, so hosts parse it themselves and ignore
/// anything they do not recognize.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum::EnumString,
    strum::Display,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Command {
    StartStop,
    Reset,
    PrevWord,
    NextWord,
    PrevSentence,
    NextSentence,
    Slower,
    Faster,
}
