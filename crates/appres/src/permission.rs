/// A repository permission checked during candidate filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
	/// See that the content exists.
	See,
	/// Open the content.
	Open,
	/// Open minor (draft) versions.
	OpenMinor,
	/// Modify the content.
	Save,
	/// Publish a version.
	Publish,
	/// Create children.
	AddNew,
	/// Delete the content.
	Delete,
	/// Run an application against the content.
	RunApplication,
	/// Change permission entries.
	SetPermissions,
}

bitflags::bitflags! {
	/// A set of repository permissions.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct PermissionSet: u32 {
		const SEE = 1 << 0;
		const OPEN = 1 << 1;
		const OPEN_MINOR = 1 << 2;
		const SAVE = 1 << 3;
		const PUBLISH = 1 << 4;
		const ADD_NEW = 1 << 5;
		const DELETE = 1 << 6;
		const RUN_APPLICATION = 1 << 7;
		const SET_PERMISSIONS = 1 << 8;
	}
}

impl Permission {
	pub const ALL: [Permission; 9] = [
		Self::See,
		Self::Open,
		Self::OpenMinor,
		Self::Save,
		Self::Publish,
		Self::AddNew,
		Self::Delete,
		Self::RunApplication,
		Self::SetPermissions,
	];

	/// Returns the bitflag for this permission.
	pub const fn as_set(self) -> PermissionSet {
		match self {
			Self::See => PermissionSet::SEE,
			Self::Open => PermissionSet::OPEN,
			Self::OpenMinor => PermissionSet::OPEN_MINOR,
			Self::Save => PermissionSet::SAVE,
			Self::Publish => PermissionSet::PUBLISH,
			Self::AddNew => PermissionSet::ADD_NEW,
			Self::Delete => PermissionSet::DELETE,
			Self::RunApplication => PermissionSet::RUN_APPLICATION,
			Self::SetPermissions => PermissionSet::SET_PERMISSIONS,
		}
	}
}

impl PermissionSet {
	/// Iterates the individual permissions in declaration order.
	pub fn permissions(self) -> impl Iterator<Item = Permission> {
		Permission::ALL
			.into_iter()
			.filter(move |p| self.contains(p.as_set()))
	}
}

impl From<Permission> for PermissionSet {
	fn from(permission: Permission) -> Self {
		permission.as_set()
	}
}

impl FromIterator<Permission> for PermissionSet {
	fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
		let mut set = PermissionSet::empty();
		for permission in iter {
			set |= permission.as_set();
		}
		set
	}
}
