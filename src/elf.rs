use goblin::elf::Elf;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElfArch {
    X86_64,
    AArch64,
    RiscV64,
    PowerPC64,
    IA64,
    I686,
    ARM,
    Other(u16),
}

impl fmt::Display for ElfArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElfArch::X86_64 => f.write_str("x86-64"),
            ElfArch::AArch64 => f.write_str("aarch64"),
            ElfArch::RiscV64 => f.write_str("riscv64"),
            ElfArch::PowerPC64 => f.write_str("ppc64"),
            ElfArch::IA64 => f.write_str("ia64"),
            ElfArch::I686 => f.write_str("i686"),
            ElfArch::ARM => f.write_str("arm"),
            ElfArch::Other(machine) => write!(
                f,
                "{} (0x{:x})",
                goblin::elf::header::machine_to_str(*machine),
                machine
            ),
        }
    }
}

/// What the ELF headers of a candidate library say about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElfIdentity {
    pub soname: Option<String>,
    pub arch: ElfArch,
}

/// Parse the ELF headers in `data`. Returns `None` for anything that is not ELF.
pub fn read_identity(data: &[u8]) -> Option<ElfIdentity> {
    let elf = match Elf::parse(data) {
        Ok(elf) => elf,
        Err(e) => {
            debug!("Not an ELF image: {}", e);
            return None;
        }
    };

    Some(ElfIdentity {
        soname: elf.soname.filter(|s| !s.is_empty()).map(str::to_string),
        arch: detect_architecture(&elf),
    })
}

fn detect_architecture(elf: &Elf) -> ElfArch {
    use goblin::elf::header::*;
    match elf.header.e_machine {
        EM_X86_64 => ElfArch::X86_64,
        EM_AARCH64 => ElfArch::AArch64,
        EM_RISCV => ElfArch::RiscV64,
        EM_PPC64 => ElfArch::PowerPC64,
        EM_IA_64 => ElfArch::IA64,
        EM_386 => ElfArch::I686,
        EM_ARM => ElfArch::ARM,
        other => ElfArch::Other(other),
    }
}

/// Vendor family of an OpenMP runtime library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeFlavor {
    /// `libiomp*`, shipped with the vendor compilers
    Intel,
    /// `libomp*`
    Llvm,
    /// `libgomp*`, shipped with GCC
    Gnu,
    Unknown,
}

impl RuntimeFlavor {
    /// Classify by SONAME or file name.
    pub fn from_name(name: &str) -> Self {
        if name.starts_with("libiomp") {
            RuntimeFlavor::Intel
        } else if name.starts_with("libgomp") {
            RuntimeFlavor::Gnu
        } else if name.starts_with("libomp") {
            RuntimeFlavor::Llvm
        } else {
            RuntimeFlavor::Unknown
        }
    }
}

impl fmt::Display for RuntimeFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RuntimeFlavor::Intel => "Intel",
            RuntimeFlavor::Llvm => "LLVM",
            RuntimeFlavor::Gnu => "GNU",
            RuntimeFlavor::Unknown => "unknown",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flavor_from_name() {
        assert_eq!(RuntimeFlavor::from_name("libiomp5.so"), RuntimeFlavor::Intel);
        assert_eq!(RuntimeFlavor::from_name("libgomp.so.1"), RuntimeFlavor::Gnu);
        assert_eq!(RuntimeFlavor::from_name("libomp.so.5"), RuntimeFlavor::Llvm);
        assert_eq!(RuntimeFlavor::from_name("libc.so.6"), RuntimeFlavor::Unknown);
    }

    #[test]
    fn non_elf_has_no_identity() {
        assert_eq!(read_identity(b"Intel(R) OMP version: 5.0"), None);
        assert_eq!(read_identity(&[]), None);
    }

    #[test]
    fn reads_identity_of_running_executable() {
        let exe = std::env::current_exe().unwrap();
        let data = std::fs::read(exe).unwrap();
        let identity = read_identity(&data).expect("test binary is ELF");
        if cfg!(target_arch = "x86_64") {
            assert_eq!(identity.arch, ElfArch::X86_64);
        }
    }

    #[test]
    fn other_arch_display_names_machine() {
        let arch = ElfArch::Other(goblin::elf::header::EM_S390);
        assert!(arch.to_string().contains("0x16"));
    }
}
