use std::collections::HashSet;

use crate::error::ReaperError;

/// Who is asking: the ids the writability rule is evaluated against.
///
/// Captured once per session. Group membership changes made while a scan
/// runs are not seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub euid:   u32,
    pub egid:   u32,
    pub groups: HashSet<u32>,
}

impl Credentials {
    pub fn new(euid: u32, egid: u32, groups: impl IntoIterator<Item = u32>) -> Self {
        Self {
            euid,
            egid,
            groups: groups.into_iter().collect(),
        }
    }

    /// Snapshot the calling process's effective ids and supplementary groups.
    #[cfg(unix)]
    #[allow(unsafe_code)]
    pub fn current() -> Result<Self, ReaperError> {
        // SAFETY: neither call takes arguments or can fail.
        let (euid, egid) = unsafe { (libc::geteuid(), libc::getegid()) };
        let groups = supplementary_groups().map_err(ReaperError::Groups)?;
        Ok(Self::new(euid, egid, groups))
    }

    #[cfg(not(unix))]
    pub fn current() -> Result<Self, ReaperError> {
        Err(ReaperError::UnsupportedPlatform)
    }

    pub fn is_superuser(&self) -> bool {
        self.euid == 0
    }

    pub fn in_group(&self, gid: u32) -> bool {
        gid == self.egid || self.groups.contains(&gid)
    }
}

#[cfg(unix)]
#[allow(unsafe_code)]
fn supplementary_groups() -> std::io::Result<Vec<u32>> {
    // SAFETY: a zero-sized query only returns the group count.
    let count = unsafe { libc::getgroups(0, std::ptr::null_mut()) };
    if count < 0 {
        return Err(std::io::Error::last_os_error());
    }

    let mut groups: Vec<libc::gid_t> = vec![0; count as usize];
    // SAFETY: `groups` holds exactly `count` writable slots.
    let filled = unsafe { libc::getgroups(count, groups.as_mut_ptr()) };
    if filled < 0 {
        return Err(std::io::Error::last_os_error());
    }
    groups.truncate(filled as usize);
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_gid_counts_as_membership() {
        let creds = Credentials::new(1000, 100, [4, 27]);
        assert!(creds.in_group(100));
        assert!(creds.in_group(27));
        assert!(!creds.in_group(5));
        assert!(!creds.is_superuser());
        assert!(Credentials::new(0, 0, []).is_superuser());
    }

    #[cfg(unix)]
    #[test]
    fn captures_the_running_process() {
        let creds = Credentials::current().unwrap();
        // SAFETY: see `Credentials::current`.
        #[allow(unsafe_code)]
        let euid = unsafe { libc::geteuid() };
        assert_eq!(creds.euid, euid);
    }
}
