use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use serde::Serialize;
use strum::{Display as StrumDisplay, EnumString};
use crate::config::BoardConfig;
use crate::sdk::SdkLayout;

/// Value of `ARDUINO` for this core (1.8.16).
pub const ARDUINO_VERSION: u32 = 10816;

const RUNTIME_LIB_PREFIX: &str = "logicrom";
const DEBUG_SUFFIX: &str = "_debug";

const CPU_FLAGS: &[&str] = &[
    "-mthumb",
    "-mthumb-interwork",
    "-mcpu=cortex-a5",
    "-mtune=generic-armv7-a",
    "-mfpu=neon-vfpv4",
    "-mfloat-abi=hard",
    "-mno-unaligned-access",
];

const CC_FLAGS: &[&str] = &[
    "-Os", // optimize for size
    "-g",
    "-fmessage-length=0",
    "-ffunction-sections", // place each function in its own section
    "-fdata-sections",
    "-fsigned-char",
    "-fno-strict-aliasing",
    "-Wall",
];

const C_FLAGS: &[&str] = &["-std=gnu11"];

const CXX_FLAGS: &[&str] = &[
    "-std=gnu++11",
    "-fno-rtti",
    "-fno-exceptions",
    "-fno-use-cxa-atexit",
    "-fno-threadsafe-statics",
];

const LINK_FLAGS: &[&str] = &[
    "-Os",
    "-Wl,--gc-sections,--relax",
    "-nostartfiles",
    "-nostdlib",
    "-nostartfiles",
    "-nodefaultlibs",
    "-u",
    "main",
];

const LIBS: &[&str] = &["logicrom4g", "c", "gcc", "m", "stdc++"];

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, StrumDisplay, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum BuildType {
    #[default]
    Release,
    Debug,
}

/// A preprocessor define, `-DNAME` or `-DNAME=VALUE`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Define {
    pub name: String,
    pub value: Option<String>,
}

impl Define {
    pub fn flag(name: &str) -> Self {
        Self { name: name.to_string(), value: None }
    }

    pub fn value(name: &str, value: impl ToString) -> Self {
        Self { name: name.to_string(), value: Some(value.to_string()) }
    }

    /// A define whose value is a C string literal.
    pub fn string(name: &str, value: &str) -> Self {
        Self::value(name, format!("\"{}\"", value.replace('"', "")))
    }

    pub fn to_flag(&self) -> String {
        format!("-D{self}")
    }
}

impl Display for Define {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}={}", self.name, value),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A static library built from framework sources and linked ahead of [BuildFlags::libs].
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct FrameworkLibrary {
    pub name: String,
    pub source_dir: PathBuf,
}

/// Compiler, assembler and linker settings for one board.
///
/// Values are never modified in place; [BuildFlags::with_build_type] returns a new table.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct BuildFlags {
    pub build_type: BuildType,
    pub asflags: Vec<String>,
    pub ccflags: Vec<String>,
    pub cflags: Vec<String>,
    pub cxxflags: Vec<String>,
    pub defines: Vec<Define>,
    pub include_dirs: Vec<PathBuf>,
    pub linkflags: Vec<String>,
    pub libs: Vec<String>,
    pub lib_dirs: Vec<PathBuf>,
    pub lib_source_dirs: Vec<PathBuf>,
    pub framework_libraries: Vec<FrameworkLibrary>,
    #[serde(skip)]
    board_debug: bool,
}

fn owned(flags: &[&str]) -> Vec<String> {
    flags.iter().map(|s| s.to_string()).collect()
}

impl BuildFlags {
    pub fn new(sdk: &SdkLayout, board: &BoardConfig, build_type: BuildType) -> Self {
        let variant = &board.build.variant;

        let ccflags: Vec<String> = CC_FLAGS.iter().chain(CPU_FLAGS).map(|s| s.to_string()).collect();

        let mut asflags = owned(&["-x", "assembler-with-cpp"]);
        asflags.extend(ccflags.iter().cloned());

        let mut linkflags = owned(CPU_FLAGS);
        linkflags.extend(owned(LINK_FLAGS));
        linkflags.push(format!("-Wl,--defsym,platform_init=platform_{variant}_init"));

        let defines = vec![
            Define::value("__BUFSIZ__", 512),
            Define::value("__FILENAME_MAX__", 256),
            Define::value("F_CPU", &board.build.f_cpu),
            Define::value("ARDUINO", ARDUINO_VERSION),
            Define::flag("ARDUINO_ARCH_ARM"),
            Define::string("ARDUINO_VARIANT", variant),
            Define::string("ARDUINO_BOARD", &board.name),
        ];

        let mut include_dirs: Vec<PathBuf> = sdk.include_dirs().into();
        include_dirs.push(sdk.core_dir());
        include_dirs.push(sdk.variant_dir(variant));

        let framework_libraries = vec![
            FrameworkLibrary { name: "FrameworkArduinoVariant".into(), source_dir: sdk.variant_dir(variant) },
            FrameworkLibrary { name: "FrameworkArduino".into(), source_dir: sdk.core_dir() },
        ];

        let flags = Self {
            build_type: BuildType::Release,
            asflags,
            ccflags,
            cflags: owned(C_FLAGS),
            cxxflags: owned(CXX_FLAGS),
            defines,
            include_dirs,
            linkflags,
            libs: owned(LIBS),
            lib_dirs: vec![sdk.lib_dir()],
            lib_source_dirs: vec![sdk.framework_libraries_dir()],
            framework_libraries,
            board_debug: board.wants_debug_runtime(),
        };

        flags.with_build_type(build_type)
    }

    pub fn with_build_type(&self, build_type: BuildType) -> Self {
        let debug_runtime = self.board_debug || build_type == BuildType::Debug;
        let libs = LIBS.iter()
            .map(|lib| {
                if debug_runtime && lib.starts_with(RUNTIME_LIB_PREFIX) {
                    format!("{lib}{DEBUG_SUFFIX}")
                } else {
                    lib.to_string()
                }
            })
            .collect();

        Self { build_type, libs, ..self.clone() }
    }

    pub fn define_flags(&self) -> impl Iterator<Item = String> + '_ {
        self.defines.iter().map(Define::to_flag)
    }

    /// `-l` arguments in link order: framework libraries first, then runtime libraries.
    pub fn link_libs(&self) -> Vec<String> {
        self.framework_libraries.iter()
            .map(|lib| &lib.name)
            .chain(&self.libs)
            .map(|name| format!("-l{name}"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoardBuild;
    use crate::host::HostPlatform;

    fn board(logicromtype: Option<&str>) -> BoardConfig {
        BoardConfig {
            name: "Logicrom \"4G\" Board".into(),
            build: BoardBuild {
                core: "rda8910".into(),
                variant: "logicrom_4g".into(),
                f_cpu: "500000000L".into(),
                logicromtype: logicromtype.map(Into::into),
            },
        }
    }

    fn sdk() -> SdkLayout {
        SdkLayout::new("/fw", "rda8910", HostPlatform::Linux)
    }

    #[test]
    fn asflags_carry_ccflags() {
        let flags = BuildFlags::new(&sdk(), &board(None), BuildType::Release);
        assert_eq!(&flags.asflags[..2], &["-x", "assembler-with-cpp"]);
        assert_eq!(&flags.asflags[2..], flags.ccflags.as_slice());
        assert!(flags.ccflags.contains(&"-mcpu=cortex-a5".to_string()));
    }

    #[test]
    fn defines_render_as_flags() {
        let flags = BuildFlags::new(&sdk(), &board(None), BuildType::Release);
        let rendered: Vec<String> = flags.define_flags().collect();
        assert_eq!(rendered, vec![
            "-D__BUFSIZ__=512",
            "-D__FILENAME_MAX__=256",
            "-DF_CPU=500000000L",
            "-DARDUINO=10816",
            "-DARDUINO_ARCH_ARM",
            "-DARDUINO_VARIANT=\"logicrom_4g\"",
            "-DARDUINO_BOARD=\"Logicrom 4G Board\"",
        ]);
    }

    #[test]
    fn linkflags_define_platform_init() {
        let flags = BuildFlags::new(&sdk(), &board(None), BuildType::Release);
        assert_eq!(
            flags.linkflags.last().unwrap(),
            "-Wl,--defsym,platform_init=platform_logicrom_4g_init"
        );
        assert_eq!(flags.link_libs(), vec![
            "-lFrameworkArduinoVariant", "-lFrameworkArduino", "-llogicrom4g", "-lc", "-lgcc", "-lm", "-lstdc++",
        ]);
    }

    #[test]
    fn include_dirs_cover_sdk_core_and_variant() {
        let flags = BuildFlags::new(&sdk(), &board(None), BuildType::Release);
        assert_eq!(flags.include_dirs, vec![
            PathBuf::from("/fw/cores/rda8910/logicromsdk/include"),
            PathBuf::from("/fw/cores/rda8910/logicromsdk/include/ril"),
            PathBuf::from("/fw/cores/rda8910"),
            PathBuf::from("/fw/variants/logicrom_4g"),
        ]);
    }

    #[test]
    fn debug_build_selects_debug_runtime_once() {
        let release = BuildFlags::new(&sdk(), &board(None), BuildType::Release);
        assert_eq!(release.libs[0], "logicrom4g");

        let debug = release.with_build_type(BuildType::Debug);
        assert_eq!(debug.libs[0], "logicrom4g_debug");
        assert_eq!(debug.with_build_type(BuildType::Debug).libs[0], "logicrom4g_debug");
        assert_eq!(debug.with_build_type(BuildType::Release).libs[0], "logicrom4g");
        // the original table is untouched
        assert_eq!(release.libs[0], "logicrom4g");
    }

    #[test]
    fn debug_board_selects_debug_runtime_in_release() {
        let flags = BuildFlags::new(&sdk(), &board(Some("debug")), BuildType::Release);
        assert_eq!(flags.libs, vec!["logicrom4g_debug", "c", "gcc", "m", "stdc++"]);
    }
}
