//! Strongly-typed source and destination identifiers.
//!
//! Every modulation source and destination is addressed by a tagged enum
//! instead of a raw integer. Slot groups (oscillator parameters, filter
//! parameters, ...) are small enums that know their own position, so the
//! flat storage index of any slot is computed from its type rather than
//! maintained by hand.
//!
//! The configuration boundary speaks a stable integer encoding:
//!
//! | raw id          | meaning                       |
//! |-----------------|-------------------------------|
//! | `0`             | none                          |
//! | `1..=17`        | per-voice sources             |
//! | `18..=29`       | global sources                |
//! | `1..=89`        | per-voice destinations        |
//! | `90..=130`      | global destinations           |
//!
//! Every id also has a stable textual name (`"lfo2"`, `"osc1.pitch_linear"`,
//! `"delay.time"`) used by routing descriptions.

use core::fmt;
use core::str::FromStr;

/// Declares a fieldless enum whose variants occupy consecutive slots.
macro_rules! slot_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every variant in slot order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Number of variants.
            pub const COUNT: usize = Self::ALL.len();

            /// Zero-based slot position.
            #[inline]
            pub const fn index(self) -> usize {
                self as usize
            }

            /// Variant at a slot position.
            pub fn from_index(index: usize) -> Option<Self> {
                Self::ALL.get(index).copied()
            }

            /// Stable lowercase name.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }

            /// Looks a variant up by its stable name.
            pub fn from_name(name: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|v| v.name() == name)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

pub(crate) use slot_enum;

slot_enum! {
    /// Per-voice modulation sources (one slot per voice).
    VoiceSource {
        /// Oscillator 1 output
        Osc1 => "osc1",
        /// Oscillator 2 output
        Osc2 => "osc2",
        /// Oscillator 3 output
        Osc3 => "osc3",
        /// Filter 1 envelope follower
        Filter1 => "filter1",
        /// Filter 2 envelope follower
        Filter2 => "filter2",
        /// Amplitude envelope
        Adsr1 => "adsr1",
        /// Filter envelope
        Adsr2 => "adsr2",
        /// Modulation envelope
        Adsr3 => "adsr3",
        /// Voice LFO 1
        Lfo1 => "lfo1",
        /// Voice LFO 2
        Lfo2 => "lfo2",
        /// Voice LFO 3
        Lfo3 => "lfo3",
        /// MIDI key of the voice's note
        MidiKey => "midi_key",
        /// MIDI velocity of the voice's note
        MidiVelocity => "midi_velocity",
        /// Random value drawn on note-on
        Random => "random",
        /// Position of the voice inside its unison stack
        UnisonPosition => "unison_position",
        /// Arpeggiator modulation 1
        ArpMod1 => "arp_mod1",
        /// Arpeggiator modulation 2
        ArpMod2 => "arp_mod2",
    }
}

slot_enum! {
    /// Global modulation sources (one slot shared by all voices).
    GlobalSource {
        /// Global LFO
        GlobalLfo => "global_lfo",
        /// Global envelope
        GlobalAdsr => "global_adsr",
        /// Shared filter envelope follower
        Filter3 => "filter3",
        /// Mod wheel (CC1)
        ModWheel => "mod_wheel",
        /// Pitch wheel
        PitchWheel => "pitch_wheel",
        /// X/Y pad, horizontal axis
        X => "x",
        /// X/Y pad, vertical axis
        Y => "y",
        /// MIDI channel pressure
        ChannelPressure => "channel_pressure",
        /// Breath controller
        Breath => "breath",
        /// Always 1.0
        Constant => "constant",
        /// Soft pedal
        SoftPedal => "soft_pedal",
        /// Sustain pedal
        SustainPedal => "sustain_pedal",
    }
}

slot_enum! {
    /// Oscillator instance inside a voice.
    OscUnit {
        /// Oscillator 1
        Osc1 => "osc1",
        /// Oscillator 2
        Osc2 => "osc2",
        /// Oscillator 3
        Osc3 => "osc3",
    }
}

slot_enum! {
    /// Modulatable oscillator parameters (union over all oscillator types).
    OscParam {
        /// Linear pitch offset
        PitchLinear => "pitch_linear",
        /// Exponential pitch offset
        PitchExponential => "pitch_exponential",
        /// Volume
        Vol => "vol",
        /// Pulse width
        PulseWidth => "pulse_width",
        /// FM carrier ratio
        CarrierRatio => "carrier_ratio",
        /// FM modulator ratio
        ModulatorRatio => "modulator_ratio",
        /// FM amount
        FmAmount => "fm_amount",
        /// Noise highpass cutoff
        HpFreq => "hp_freq",
        /// Noise lowpass cutoff
        LpFreq => "lp_freq",
        /// Vector X position
        X => "x",
        /// Vector Y position
        Y => "y",
        /// Wavetable position
        Position => "position",
        /// Detune
        Detune => "detune",
        /// Multi-oscillator spread
        Spread => "spread",
        /// Chiptune arpeggio speed
        ArpSpeed => "arp_speed",
    }
}

slot_enum! {
    /// Filter instance inside a voice.
    FilterUnit {
        /// Filter 1
        Filter1 => "filter1",
        /// Filter 2
        Filter2 => "filter2",
    }
}

slot_enum! {
    /// Modulatable filter parameters (union over all filter models).
    FilterParam {
        /// Cutoff frequency
        Freq => "freq",
        /// Resonance
        Res => "res",
        /// Drive
        Drive => "drive",
        /// Output gain
        Gain => "gain",
        /// Saturation
        Saturation => "saturation",
        /// Envelope amount
        EnvAmount => "env_amount",
        /// Velocity amount
        VelAmount => "vel_amount",
        /// Keyboard tracking amount
        KbdAmount => "kbd_amount",
        /// SEM lowpass/highpass transition
        SemTransition => "sem_transition",
        /// Formant vowel transition
        FormantTransition => "formant_transition",
        /// Ring modulation amount
        RingmodAmount => "ringmod_amount",
    }
}

slot_enum! {
    /// Envelope instance inside a voice.
    EnvelopeUnit {
        /// Amplitude envelope
        Adsr1 => "adsr1",
        /// Filter envelope
        Adsr2 => "adsr2",
        /// Modulation envelope
        Adsr3 => "adsr3",
    }
}

slot_enum! {
    /// Modulatable envelope parameters.
    AdsrParam {
        /// Attack time
        Attack => "attack",
        /// Decay time
        Decay => "decay",
        /// Sustain level
        Sustain => "sustain",
        /// Release time
        Release => "release",
    }
}

slot_enum! {
    /// LFO instance inside a voice.
    LfoUnit {
        /// Voice LFO 1
        Lfo1 => "lfo1",
        /// Voice LFO 2
        Lfo2 => "lfo2",
        /// Voice LFO 3
        Lfo3 => "lfo3",
    }
}

slot_enum! {
    /// Modulatable amplifier parameters.
    AmpParam {
        /// Output gain
        Gain => "gain",
        /// Stereo pan
        Pan => "pan",
        /// Velocity sensitivity
        Vel => "vel",
    }
}

slot_enum! {
    /// Modulatable distortion parameters.
    DistortionParam {
        /// Input boost
        Boost => "boost",
        /// Dry/wet mix
        DryWet => "drywet",
    }
}

slot_enum! {
    /// Modulatable delay parameters.
    DelayParam {
        /// Delay time
        Time => "time",
        /// Feedback
        Feedback => "feedback",
        /// Feedback highpass cutoff
        HpFreq => "hp_freq",
        /// Ducking amount
        Ducking => "ducking",
        /// Dry level
        Dry => "dry",
        /// Wet level
        Wet => "wet",
    }
}

slot_enum! {
    /// Modulatable phaser parameters.
    PhaserParam {
        /// LFO depth
        Amount => "amount",
        /// LFO rate
        Rate => "rate",
        /// Dry/wet mix
        DryWet => "drywet",
        /// Center frequency
        Freq => "freq",
        /// Feedback
        Feedback => "feedback",
    }
}

slot_enum! {
    /// Modulatable flanger parameters.
    FlangerParam {
        /// LFO depth
        Amount => "amount",
        /// LFO rate
        Freq => "freq",
        /// Feedback
        Feedback => "feedback",
        /// Dry/wet mix
        DryWet => "drywet",
    }
}

slot_enum! {
    /// Modulatable chorus parameters.
    ChorusParam {
        /// LFO depth
        Amount => "amount",
        /// LFO rate
        Freq => "freq",
        /// Feedback
        Feedback => "feedback",
        /// Dry/wet mix
        DryWet => "drywet",
    }
}

slot_enum! {
    /// Modulatable arpeggiator parameters.
    ArpParam {
        /// Step speed
        Speed => "speed",
        /// Gate length
        Gate => "gate",
    }
}

slot_enum! {
    /// Modulatable X/Y pad parameters.
    XyParam {
        /// Horizontal axis
        X => "x",
        /// Vertical axis
        Y => "y",
    }
}

slot_enum! {
    /// Miscellaneous global parameters.
    MiscParam {
        /// Master volume
        Master => "master",
        /// Glide time
        Glide => "glide",
    }
}

/// Errors produced when decoding identifiers at the configuration boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdError {
    /// Raw source id outside the known range.
    SourceOutOfRange(u16),
    /// Raw destination id outside the known range.
    DestinationOutOfRange(u16),
    /// Source name not recognized.
    UnknownSourceName,
    /// Destination name not recognized.
    UnknownDestinationName,
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceOutOfRange(raw) => {
                write!(f, "source id {raw} out of range 0..={}", SourceId::MAX_RAW)
            }
            Self::DestinationOutOfRange(raw) => {
                write!(
                    f,
                    "destination id {raw} out of range 0..={}",
                    DestinationId::MAX_RAW
                )
            }
            Self::UnknownSourceName => write!(f, "unknown source name"),
            Self::UnknownDestinationName => write!(f, "unknown destination name"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for IdError {}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Identifier of a modulation source slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SourceId {
    /// No source; the row is silent.
    #[default]
    None,
    /// Per-voice source.
    Voice(VoiceSource),
    /// Global source shared by every voice.
    Global(GlobalSource),
}

impl SourceId {
    /// Largest valid raw id.
    pub const MAX_RAW: u16 = (VoiceSource::COUNT + GlobalSource::COUNT) as u16;

    /// Decode a raw configuration id.
    pub fn from_raw(raw: u16) -> Result<Self, IdError> {
        let index = raw as usize;
        if raw == 0 {
            Ok(Self::None)
        } else if index <= VoiceSource::COUNT {
            VoiceSource::from_index(index - 1)
                .map(Self::Voice)
                .ok_or(IdError::SourceOutOfRange(raw))
        } else {
            GlobalSource::from_index(index - 1 - VoiceSource::COUNT)
                .map(Self::Global)
                .ok_or(IdError::SourceOutOfRange(raw))
        }
    }

    /// Encode as a raw configuration id.
    pub const fn to_raw(self) -> u16 {
        match self {
            Self::None => 0,
            Self::Voice(source) => (source.index() + 1) as u16,
            Self::Global(source) => (source.index() + 1 + VoiceSource::COUNT) as u16,
        }
    }

    /// `true` for the "no source" sentinel.
    pub const fn is_none(self) -> bool {
        matches!(self, Self::None)
    }

    /// `true` if the source has one slot per voice.
    pub const fn is_poly(self) -> bool {
        matches!(self, Self::Voice(_))
    }

    /// Stable name (`"none"` for the sentinel).
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Voice(source) => source.name(),
            Self::Global(source) => source.name(),
        }
    }

    /// Iterate every routable source in raw-id order.
    pub fn iter() -> impl Iterator<Item = Self> {
        VoiceSource::ALL
            .iter()
            .copied()
            .map(Self::Voice)
            .chain(GlobalSource::ALL.iter().copied().map(Self::Global))
    }
}

impl From<VoiceSource> for SourceId {
    fn from(source: VoiceSource) -> Self {
        Self::Voice(source)
    }
}

impl From<GlobalSource> for SourceId {
    fn from(source: GlobalSource) -> Self {
        Self::Global(source)
    }
}

impl TryFrom<u16> for SourceId {
    type Error = IdError;

    fn try_from(raw: u16) -> Result<Self, Self::Error> {
        Self::from_raw(raw)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SourceId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "none" {
            return Ok(Self::None);
        }
        VoiceSource::from_name(s)
            .map(Self::Voice)
            .or_else(|| GlobalSource::from_name(s).map(Self::Global))
            .ok_or(IdError::UnknownSourceName)
    }
}

// ---------------------------------------------------------------------------
// Destinations
// ---------------------------------------------------------------------------

const OSC_BASE: usize = 0;
const FILTER_BASE: usize = OSC_BASE + OscUnit::COUNT * OscParam::COUNT;
const ADSR_BASE: usize = FILTER_BASE + FilterUnit::COUNT * FilterParam::COUNT;
const LFO_BASE: usize = ADSR_BASE + EnvelopeUnit::COUNT * AdsrParam::COUNT;
const AMP_BASE: usize = LFO_BASE + LfoUnit::COUNT;
const DISTORTION_BASE: usize = AMP_BASE + AmpParam::COUNT;
const VOICE_PITCH_LINEAR: usize = DISTORTION_BASE + DistortionParam::COUNT;
const VOICE_PITCH_EXPONENTIAL: usize = VOICE_PITCH_LINEAR + 1;

/// Per-voice modulation destinations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VoiceDest {
    /// Oscillator parameter.
    Osc(OscUnit, OscParam),
    /// Filter parameter.
    Filter(FilterUnit, FilterParam),
    /// Envelope parameter.
    Adsr(EnvelopeUnit, AdsrParam),
    /// LFO rate.
    LfoFreq(LfoUnit),
    /// Amplifier parameter.
    Amp(AmpParam),
    /// Distortion parameter.
    Distortion(DistortionParam),
    /// Linear pitch offset applied to every oscillator of the voice.
    PitchLinear,
    /// Exponential pitch offset applied to every oscillator of the voice.
    PitchExponential,
}

impl VoiceDest {
    /// Number of per-voice destination slots.
    pub const COUNT: usize = VOICE_PITCH_EXPONENTIAL + 1;

    /// Flat slot index inside one voice's destination block.
    pub const fn slot(self) -> usize {
        match self {
            Self::Osc(unit, param) => OSC_BASE + unit.index() * OscParam::COUNT + param.index(),
            Self::Filter(unit, param) => {
                FILTER_BASE + unit.index() * FilterParam::COUNT + param.index()
            }
            Self::Adsr(unit, param) => ADSR_BASE + unit.index() * AdsrParam::COUNT + param.index(),
            Self::LfoFreq(unit) => LFO_BASE + unit.index(),
            Self::Amp(param) => AMP_BASE + param.index(),
            Self::Distortion(param) => DISTORTION_BASE + param.index(),
            Self::PitchLinear => VOICE_PITCH_LINEAR,
            Self::PitchExponential => VOICE_PITCH_EXPONENTIAL,
        }
    }

    /// Inverse of [`slot`](Self::slot).
    pub fn from_slot(slot: usize) -> Option<Self> {
        let dest = match slot {
            s if s < FILTER_BASE => {
                let s = s - OSC_BASE;
                Self::Osc(
                    OscUnit::from_index(s / OscParam::COUNT)?,
                    OscParam::from_index(s % OscParam::COUNT)?,
                )
            }
            s if s < ADSR_BASE => {
                let s = s - FILTER_BASE;
                Self::Filter(
                    FilterUnit::from_index(s / FilterParam::COUNT)?,
                    FilterParam::from_index(s % FilterParam::COUNT)?,
                )
            }
            s if s < LFO_BASE => {
                let s = s - ADSR_BASE;
                Self::Adsr(
                    EnvelopeUnit::from_index(s / AdsrParam::COUNT)?,
                    AdsrParam::from_index(s % AdsrParam::COUNT)?,
                )
            }
            s if s < AMP_BASE => Self::LfoFreq(LfoUnit::from_index(s - LFO_BASE)?),
            s if s < DISTORTION_BASE => Self::Amp(AmpParam::from_index(s - AMP_BASE)?),
            s if s < VOICE_PITCH_LINEAR => {
                Self::Distortion(DistortionParam::from_index(s - DISTORTION_BASE)?)
            }
            VOICE_PITCH_LINEAR => Self::PitchLinear,
            VOICE_PITCH_EXPONENTIAL => Self::PitchExponential,
            _ => return None,
        };
        Some(dest)
    }

    /// Iterate every per-voice destination in slot order.
    pub fn iter() -> impl Iterator<Item = Self> {
        (0..Self::COUNT).filter_map(Self::from_slot)
    }
}

impl fmt::Display for VoiceDest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Osc(unit, param) => write!(f, "{unit}.{param}"),
            Self::Filter(unit, param) => write!(f, "{unit}.{param}"),
            Self::Adsr(unit, param) => write!(f, "{unit}.{param}"),
            Self::LfoFreq(unit) => write!(f, "{unit}.freq"),
            Self::Amp(param) => write!(f, "amp.{param}"),
            Self::Distortion(param) => write!(f, "distortion.{param}"),
            Self::PitchLinear => f.write_str("pitch_linear"),
            Self::PitchExponential => f.write_str("pitch_exponential"),
        }
    }
}

impl FromStr for VoiceDest {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = IdError::UnknownDestinationName;
        let Some((group, param)) = s.split_once('.') else {
            return match s {
                "pitch_linear" => Ok(Self::PitchLinear),
                "pitch_exponential" => Ok(Self::PitchExponential),
                _ => Err(unknown),
            };
        };

        if let Some(unit) = OscUnit::from_name(group) {
            return OscParam::from_name(param)
                .map(|p| Self::Osc(unit, p))
                .ok_or(unknown);
        }
        if let Some(unit) = FilterUnit::from_name(group) {
            return FilterParam::from_name(param)
                .map(|p| Self::Filter(unit, p))
                .ok_or(unknown);
        }
        if let Some(unit) = EnvelopeUnit::from_name(group) {
            return AdsrParam::from_name(param)
                .map(|p| Self::Adsr(unit, p))
                .ok_or(unknown);
        }
        if let Some(unit) = LfoUnit::from_name(group) {
            return (param == "freq").then_some(Self::LfoFreq(unit)).ok_or(unknown);
        }
        match group {
            "amp" => AmpParam::from_name(param).map(Self::Amp).ok_or(unknown),
            "distortion" => DistortionParam::from_name(param)
                .map(Self::Distortion)
                .ok_or(unknown),
            _ => Err(unknown),
        }
    }
}

const GLOBAL_ADSR_BASE: usize = 0;
const GLOBAL_LFO_FREQ: usize = GLOBAL_ADSR_BASE + AdsrParam::COUNT;
const FILTER3_BASE: usize = GLOBAL_LFO_FREQ + 1;
const DELAY_BASE: usize = FILTER3_BASE + FilterParam::COUNT;
const PHASER_BASE: usize = DELAY_BASE + DelayParam::COUNT;
const FLANGER_BASE: usize = PHASER_BASE + PhaserParam::COUNT;
const CHORUS_BASE: usize = FLANGER_BASE + FlangerParam::COUNT;
const ARP_BASE: usize = CHORUS_BASE + ChorusParam::COUNT;
const XY_BASE: usize = ARP_BASE + ArpParam::COUNT;
const MISC_BASE: usize = XY_BASE + XyParam::COUNT;

/// Global modulation destinations (one slot shared by all voices).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GlobalDest {
    /// Global envelope parameter.
    Adsr(AdsrParam),
    /// Global LFO rate.
    LfoFreq,
    /// Shared filter parameter.
    Filter3(FilterParam),
    /// Delay parameter.
    Delay(DelayParam),
    /// Phaser parameter.
    Phaser(PhaserParam),
    /// Flanger parameter.
    Flanger(FlangerParam),
    /// Chorus parameter.
    Chorus(ChorusParam),
    /// Arpeggiator parameter.
    Arp(ArpParam),
    /// X/Y pad parameter.
    Xy(XyParam),
    /// Master volume or glide.
    Misc(MiscParam),
}

impl GlobalDest {
    /// Number of global destination slots.
    pub const COUNT: usize = MISC_BASE + MiscParam::COUNT;

    /// Flat slot index inside the global destination block.
    pub const fn slot(self) -> usize {
        match self {
            Self::Adsr(param) => GLOBAL_ADSR_BASE + param.index(),
            Self::LfoFreq => GLOBAL_LFO_FREQ,
            Self::Filter3(param) => FILTER3_BASE + param.index(),
            Self::Delay(param) => DELAY_BASE + param.index(),
            Self::Phaser(param) => PHASER_BASE + param.index(),
            Self::Flanger(param) => FLANGER_BASE + param.index(),
            Self::Chorus(param) => CHORUS_BASE + param.index(),
            Self::Arp(param) => ARP_BASE + param.index(),
            Self::Xy(param) => XY_BASE + param.index(),
            Self::Misc(param) => MISC_BASE + param.index(),
        }
    }

    /// Inverse of [`slot`](Self::slot).
    pub fn from_slot(slot: usize) -> Option<Self> {
        let dest = match slot {
            s if s < GLOBAL_LFO_FREQ => Self::Adsr(AdsrParam::from_index(s - GLOBAL_ADSR_BASE)?),
            GLOBAL_LFO_FREQ => Self::LfoFreq,
            s if s < DELAY_BASE => Self::Filter3(FilterParam::from_index(s - FILTER3_BASE)?),
            s if s < PHASER_BASE => Self::Delay(DelayParam::from_index(s - DELAY_BASE)?),
            s if s < FLANGER_BASE => Self::Phaser(PhaserParam::from_index(s - PHASER_BASE)?),
            s if s < CHORUS_BASE => Self::Flanger(FlangerParam::from_index(s - FLANGER_BASE)?),
            s if s < ARP_BASE => Self::Chorus(ChorusParam::from_index(s - CHORUS_BASE)?),
            s if s < XY_BASE => Self::Arp(ArpParam::from_index(s - ARP_BASE)?),
            s if s < MISC_BASE => Self::Xy(XyParam::from_index(s - XY_BASE)?),
            s => Self::Misc(MiscParam::from_index(s - MISC_BASE)?),
        };
        Some(dest)
    }

    /// Iterate every global destination in slot order.
    pub fn iter() -> impl Iterator<Item = Self> {
        (0..Self::COUNT).filter_map(Self::from_slot)
    }
}

impl fmt::Display for GlobalDest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Adsr(param) => write!(f, "global_adsr.{param}"),
            Self::LfoFreq => f.write_str("global_lfo.freq"),
            Self::Filter3(param) => write!(f, "filter3.{param}"),
            Self::Delay(param) => write!(f, "delay.{param}"),
            Self::Phaser(param) => write!(f, "phaser.{param}"),
            Self::Flanger(param) => write!(f, "flanger.{param}"),
            Self::Chorus(param) => write!(f, "chorus.{param}"),
            Self::Arp(param) => write!(f, "arp.{param}"),
            Self::Xy(param) => write!(f, "xy.{param}"),
            Self::Misc(param) => write!(f, "misc.{param}"),
        }
    }
}

impl FromStr for GlobalDest {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = IdError::UnknownDestinationName;
        let (group, param) = s.split_once('.').ok_or(unknown)?;
        let dest = match group {
            "global_adsr" => AdsrParam::from_name(param).map(Self::Adsr),
            "global_lfo" => (param == "freq").then_some(Self::LfoFreq),
            "filter3" => FilterParam::from_name(param).map(Self::Filter3),
            "delay" => DelayParam::from_name(param).map(Self::Delay),
            "phaser" => PhaserParam::from_name(param).map(Self::Phaser),
            "flanger" => FlangerParam::from_name(param).map(Self::Flanger),
            "chorus" => ChorusParam::from_name(param).map(Self::Chorus),
            "arp" => ArpParam::from_name(param).map(Self::Arp),
            "xy" => XyParam::from_name(param).map(Self::Xy),
            "misc" => MiscParam::from_name(param).map(Self::Misc),
            _ => None,
        };
        dest.ok_or(unknown)
    }
}

/// Identifier of a modulation destination slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DestinationId {
    /// No destination; the row slot is inactive.
    #[default]
    None,
    /// Per-voice destination.
    Voice(VoiceDest),
    /// Global destination shared by every voice.
    Global(GlobalDest),
}

impl DestinationId {
    /// Largest valid raw id.
    pub const MAX_RAW: u16 = (VoiceDest::COUNT + GlobalDest::COUNT) as u16;

    /// Decode a raw configuration id.
    pub fn from_raw(raw: u16) -> Result<Self, IdError> {
        let index = raw as usize;
        if raw == 0 {
            Ok(Self::None)
        } else if index <= VoiceDest::COUNT {
            VoiceDest::from_slot(index - 1)
                .map(Self::Voice)
                .ok_or(IdError::DestinationOutOfRange(raw))
        } else {
            GlobalDest::from_slot(index - 1 - VoiceDest::COUNT)
                .map(Self::Global)
                .ok_or(IdError::DestinationOutOfRange(raw))
        }
    }

    /// Encode as a raw configuration id.
    pub const fn to_raw(self) -> u16 {
        match self {
            Self::None => 0,
            Self::Voice(dest) => (dest.slot() + 1) as u16,
            Self::Global(dest) => (dest.slot() + 1 + VoiceDest::COUNT) as u16,
        }
    }

    /// `true` for the "no destination" sentinel.
    pub const fn is_none(self) -> bool {
        matches!(self, Self::None)
    }

    /// `true` if the destination has one slot per voice.
    pub const fn is_poly(self) -> bool {
        matches!(self, Self::Voice(_))
    }

    /// Iterate every routable destination in raw-id order.
    pub fn iter() -> impl Iterator<Item = Self> {
        VoiceDest::iter()
            .map(Self::Voice)
            .chain(GlobalDest::iter().map(Self::Global))
    }
}

impl From<VoiceDest> for DestinationId {
    fn from(dest: VoiceDest) -> Self {
        Self::Voice(dest)
    }
}

impl From<GlobalDest> for DestinationId {
    fn from(dest: GlobalDest) -> Self {
        Self::Global(dest)
    }
}

impl TryFrom<u16> for DestinationId {
    type Error = IdError;

    fn try_from(raw: u16) -> Result<Self, Self::Error> {
        Self::from_raw(raw)
    }
}

impl fmt::Display for DestinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Voice(dest) => fmt::Display::fmt(dest, f),
            Self::Global(dest) => fmt::Display::fmt(dest, f),
        }
    }
}

impl FromStr for DestinationId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "none" {
            return Ok(Self::None);
        }
        s.parse::<VoiceDest>()
            .map(Self::Voice)
            .or_else(|_| s.parse::<GlobalDest>().map(Self::Global))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(feature = "std"))]
    use alloc::string::ToString;

    #[test]
    fn slot_counts_match_layout() {
        assert_eq!(VoiceSource::COUNT, 17);
        assert_eq!(GlobalSource::COUNT, 12);
        assert_eq!(VoiceDest::COUNT, 89);
        assert_eq!(GlobalDest::COUNT, 41);
        assert_eq!(SourceId::MAX_RAW, 29);
        assert_eq!(DestinationId::MAX_RAW, 130);
    }

    #[test]
    fn voice_dest_slots_are_dense_and_invertible() {
        for slot in 0..VoiceDest::COUNT {
            let dest = VoiceDest::from_slot(slot).expect("every slot decodes");
            assert_eq!(dest.slot(), slot);
        }
        assert_eq!(VoiceDest::from_slot(VoiceDest::COUNT), None);
        assert_eq!(VoiceDest::iter().count(), VoiceDest::COUNT);
    }

    #[test]
    fn global_dest_slots_are_dense_and_invertible() {
        for slot in 0..GlobalDest::COUNT {
            let dest = GlobalDest::from_slot(slot).expect("every slot decodes");
            assert_eq!(dest.slot(), slot);
        }
        assert_eq!(GlobalDest::from_slot(GlobalDest::COUNT), None);
    }

    #[test]
    fn raw_ids_cover_full_range() {
        for raw in 0..=SourceId::MAX_RAW {
            let id = SourceId::from_raw(raw).unwrap();
            assert_eq!(id.to_raw(), raw);
        }
        for raw in 0..=DestinationId::MAX_RAW {
            let id = DestinationId::from_raw(raw).unwrap();
            assert_eq!(id.to_raw(), raw);
        }
    }

    #[test]
    fn out_of_range_raw_ids_are_rejected() {
        assert_eq!(
            SourceId::from_raw(SourceId::MAX_RAW + 1),
            Err(IdError::SourceOutOfRange(SourceId::MAX_RAW + 1))
        );
        assert_eq!(
            DestinationId::from_raw(500),
            Err(IdError::DestinationOutOfRange(500))
        );
    }

    #[test]
    fn raw_zero_is_the_none_sentinel() {
        assert_eq!(SourceId::from_raw(0), Ok(SourceId::None));
        assert_eq!(DestinationId::from_raw(0), Ok(DestinationId::None));
        assert!(SourceId::None.is_none());
        assert!(!SourceId::None.is_poly());
    }

    #[test]
    fn first_global_ids_follow_voice_block() {
        assert_eq!(
            SourceId::from_raw(18),
            Ok(SourceId::Global(GlobalSource::GlobalLfo))
        );
        assert_eq!(
            DestinationId::from_raw(90),
            Ok(DestinationId::Global(GlobalDest::Adsr(AdsrParam::Attack)))
        );
        assert_eq!(
            DestinationId::from_raw(1),
            Ok(DestinationId::Voice(VoiceDest::Osc(
                OscUnit::Osc1,
                OscParam::PitchLinear
            )))
        );
    }

    #[test]
    fn names_parse_back() {
        for id in DestinationId::iter() {
            let name = id.to_string();
            assert_eq!(name.parse::<DestinationId>(), Ok(id), "name {name}");
        }
        for id in SourceId::iter() {
            assert_eq!(id.name().parse::<SourceId>(), Ok(id));
        }
    }

    #[test]
    fn destination_names_are_readable() {
        let pitch = DestinationId::Voice(VoiceDest::Osc(OscUnit::Osc1, OscParam::PitchLinear));
        assert_eq!(pitch.to_string(), "osc1.pitch_linear");
        let delay = DestinationId::Global(GlobalDest::Delay(DelayParam::Time));
        assert_eq!(delay.to_string(), "delay.time");
        assert_eq!(
            "lfo2.freq".parse::<DestinationId>(),
            Ok(DestinationId::Voice(VoiceDest::LfoFreq(LfoUnit::Lfo2)))
        );
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert_eq!("lfo9".parse::<SourceId>(), Err(IdError::UnknownSourceName));
        assert_eq!(
            "osc1.volume".parse::<DestinationId>(),
            Err(IdError::UnknownDestinationName)
        );
        assert_eq!(
            "reverb.size".parse::<DestinationId>(),
            Err(IdError::UnknownDestinationName)
        );
    }

    #[test]
    fn poly_classification() {
        assert!(SourceId::Voice(VoiceSource::Lfo1).is_poly());
        assert!(!SourceId::Global(GlobalSource::GlobalLfo).is_poly());
        assert!(DestinationId::Voice(VoiceDest::PitchLinear).is_poly());
        assert!(!DestinationId::Global(GlobalDest::LfoFreq).is_poly());
    }
}
