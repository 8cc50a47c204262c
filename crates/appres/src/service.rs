//! Facade wiring the generation holder, the resolver and the collaborators together.

use std::collections::BTreeSet;
use std::sync::{Arc, Weak};

use crate::cluster::{ClusterChannel, InvalidationListener, InvalidationMessage, InvalidationReason, LoopbackCluster};
use crate::collab::{ApplicationStore, ContentTypes, DeviceResolver, SecurityOracle};
use crate::config::ResolverConfig;
use crate::content::ContentHead;
use crate::generation::{ContentEvent, GenerationManager};
use crate::resolve::{ListingOrder, ResolvedApplication, Resolver};

/// Entry point for application lookups.
///
/// Cheap to share behind an `Arc`; every query pins the current generation once.
pub struct ApplicationResolver {
	manager: Arc<GenerationManager>,
	config: Arc<ResolverConfig>,
	types: Arc<dyn ContentTypes>,
	security: Arc<dyn SecurityOracle>,
	devices: Option<Arc<dyn DeviceResolver>>,
}

impl ApplicationResolver {
	pub fn builder(
		store: Arc<dyn ApplicationStore>,
		types: Arc<dyn ContentTypes>,
		security: Arc<dyn SecurityOracle>,
	) -> ApplicationResolverBuilder {
		ApplicationResolverBuilder::new(store, types, security)
	}

	fn resolver(&self) -> Resolver<'_> {
		Resolver::new(
			self.manager.current(),
			&self.config,
			self.types.as_ref(),
			self.security.as_ref(),
		)
	}

	/// Resolves `action` (or the default action) for `head`.
	pub fn resolve_one(
		&self,
		head: &ContentHead,
		action: Option<&str>,
		devices: &[String],
	) -> Option<ResolvedApplication> {
		self.resolver().resolve_one(head, action, devices)
	}

	/// Lists applications available on `head`, sorted by index then action name.
	pub fn resolve_by_scenario(
		&self,
		head: &ContentHead,
		scenario: Option<&str>,
		devices: &[String],
	) -> Vec<ResolvedApplication> {
		self.resolver()
			.resolve_by_scenario(head, scenario, devices, ListingOrder::ByName)
	}

	/// Lists applications available on `head`, sorted by index then display text.
	pub fn resolve_by_scenario_by_text(
		&self,
		head: &ContentHead,
		scenario: Option<&str>,
		devices: &[String],
	) -> Vec<ResolvedApplication> {
		self.resolver()
			.resolve_by_scenario(head, scenario, devices, ListingOrder::ByText)
	}

	/// Returns true if any application is bound to `action`.
	pub fn exists(&self, action: &str) -> bool {
		self.manager.current().exists(action)
	}

	pub fn known_scenarios(&self) -> BTreeSet<String> {
		self.manager.current().known_scenarios()
	}

	/// Builds the device fallback chain for a request.
	///
	/// An explicitly requested device takes precedence over the one identified from the user
	/// agent. Without a device resolver the chain holds just the device itself.
	pub fn device_chain(&self, requested: Option<&str>, user_agent: Option<&str>) -> Vec<String> {
		let requested = requested.map(str::trim).filter(|d| !d.is_empty());
		let device = match (requested, &self.devices) {
			(Some(device), _) => device.to_string(),
			(None, Some(devices)) => match user_agent.and_then(|ua| devices.identify_device(ua)) {
				Some(device) => device,
				None => return Vec::new(),
			},
			(None, None) => return Vec::new(),
		};

		let Some(devices) = &self.devices else {
			return vec![device];
		};
		let mut chain = devices.device_chain(&device);
		if !chain.iter().any(|d| d.eq_ignore_ascii_case(&device)) {
			chain.insert(0, device);
		}
		chain
	}

	/// Evaluates a content event. Returns true if the index was invalidated.
	pub fn handle_event(&self, event: &ContentEvent) -> bool {
		self.manager.handle_event(event)
	}

	/// Drops the index here and on every peer.
	pub fn invalidate(&self) {
		self.manager.invalidate(InvalidationReason::Manual);
	}

	pub fn on_cluster_message(&self, message: &InvalidationMessage) -> bool {
		self.manager.on_cluster_message(message)
	}

	/// Listener to register with an inbound cluster transport.
	pub fn listener(&self) -> Weak<dyn InvalidationListener> {
		Arc::downgrade(&self.manager) as Weak<dyn InvalidationListener>
	}

	pub fn manager(&self) -> &Arc<GenerationManager> {
		&self.manager
	}
}

pub struct ApplicationResolverBuilder {
	store: Arc<dyn ApplicationStore>,
	types: Arc<dyn ContentTypes>,
	security: Arc<dyn SecurityOracle>,
	config: ResolverConfig,
	devices: Option<Arc<dyn DeviceResolver>>,
	cluster: Option<Arc<dyn ClusterChannel>>,
	loopback: Option<Arc<LoopbackCluster>>,
}

impl ApplicationResolverBuilder {
	pub fn new(
		store: Arc<dyn ApplicationStore>,
		types: Arc<dyn ContentTypes>,
		security: Arc<dyn SecurityOracle>,
	) -> Self {
		Self {
			store,
			types,
			security,
			config: ResolverConfig::default(),
			devices: None,
			cluster: None,
			loopback: None,
		}
	}

	pub fn config(mut self, config: ResolverConfig) -> Self {
		self.config = config;
		self
	}

	pub fn devices(mut self, devices: Arc<dyn DeviceResolver>) -> Self {
		self.devices = Some(devices);
		self
	}

	/// Broadcasts invalidations through `channel`. Inbound delivery is wired separately via
	/// [`ApplicationResolver::listener`].
	pub fn cluster(mut self, channel: Arc<dyn ClusterChannel>) -> Self {
		self.cluster = Some(channel);
		self.loopback = None;
		self
	}

	/// Joins an in-process cluster for both directions.
	pub fn loopback(mut self, cluster: Arc<LoopbackCluster>) -> Self {
		self.cluster = Some(Arc::clone(&cluster) as Arc<dyn ClusterChannel>);
		self.loopback = Some(cluster);
		self
	}

	pub fn build(self) -> ApplicationResolver {
		let config = Arc::new(self.config);
		let manager = Arc::new(GenerationManager::new(
			Arc::clone(&config),
			self.store,
			Arc::clone(&self.types),
			self.cluster,
		));
		let resolver = ApplicationResolver {
			manager,
			config,
			types: self.types,
			security: self.security,
			devices: self.devices,
		};
		if let Some(loopback) = self.loopback {
			loopback.subscribe(resolver.listener());
		}
		resolver
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	use super::*;
	use crate::record::RecordFlags;
	use crate::test_fixtures::{Grants, MemoryStore, StaticDevices, StaticTypes, app, head};

	fn resolver(store: &Arc<MemoryStore>) -> ApplicationResolver {
		ApplicationResolver::builder(
			Arc::clone(store) as Arc<dyn ApplicationStore>,
			Arc::new(StaticTypes::standard()),
			Grants::allow_all(),
		)
		.devices(Arc::new(StaticDevices))
		.build()
	}

	fn store() -> Arc<MemoryStore> {
		MemoryStore::with_records(vec![
			app(1, "/Root/(apps)/GenericContent/Browse")
				.with_scenarios("ContextMenu")
				.with_field("icon", "page"),
			app(2, "/Root/(apps)/GenericContent/Browse/mobile").with_field("icon", "phone"),
			app(3, "/Root/(apps)/Folder/Upload")
				.with_scenarios("ContextMenu")
				.with_index(-1)
				.with_field("text", "Upload files"),
		])
	}

	#[rstest]
	#[case::explicit(Some("iPad"), None, &["ipad", "tablet", "mobile"])]
	#[case::explicit_wins(Some("iphone"), Some("Mozilla (iPad)"), &["iphone", "mobile"])]
	#[case::user_agent(None, Some("Mozilla (iPhone)"), &["iphone", "mobile"])]
	#[case::blank_request(Some("  "), Some("Mozilla (iPhone)"), &["iphone", "mobile"])]
	#[case::unknown_agent(None, Some("curl/8.0"), &[])]
	#[case::unknown_device(Some("watch"), None, &["watch"])]
	fn device_chain_combines_request_and_user_agent(
		#[case] requested: Option<&str>,
		#[case] user_agent: Option<&str>,
		#[case] expected: &[&str],
	) {
		let resolver = resolver(&store());
		assert_eq!(resolver.device_chain(requested, user_agent), expected);
	}

	#[test]
	fn device_chain_without_device_resolver() {
		let store = store();
		let resolver = ApplicationResolver::builder(
			Arc::clone(&store) as Arc<dyn ApplicationStore>,
			Arc::new(StaticTypes::standard()),
			Grants::allow_all(),
		)
		.build();
		assert_eq!(resolver.device_chain(Some("iphone"), None), ["iphone"]);
		assert!(resolver.device_chain(None, Some("Mozilla (iPhone)")).is_empty());
	}

	#[test]
	fn resolves_through_the_facade() {
		let resolver = resolver(&store());
		let folder = head(10, "/Root/Docs", "Folder");

		let plain = resolver.resolve_one(&folder, None, &[]).unwrap();
		assert_eq!(plain.icon(), Some("page"));
		let devices = resolver.device_chain(None, Some("Mozilla (iPhone)"));
		let phone = resolver.resolve_one(&folder, None, &devices).unwrap();
		assert_eq!(phone.icon(), Some("phone"));

		let listed: Vec<_> = resolver
			.resolve_by_scenario(&folder, Some("contextmenu"), &[])
			.iter()
			.map(|a| a.id())
			.collect();
		assert_eq!(listed, [3, 1]);
		assert_eq!(
			resolver
				.resolve_by_scenario_by_text(&folder, None, &[])
				.len(),
			2
		);

		assert!(resolver.exists("upload"));
		assert!(!resolver.exists("publish"));
		assert_eq!(
			resolver.known_scenarios().into_iter().collect::<Vec<_>>(),
			["ContextMenu"]
		);
	}

	#[test]
	fn content_events_rebuild_on_next_query() {
		let store = store();
		let resolver = resolver(&store);
		let docs = head(10, "/Root/Docs", "Folder");
		assert!(resolver.resolve_one(&docs, Some("browse"), &[]).is_some());

		store.push(app(4, "/Root/Docs/(apps)/This/Browse").with_flags(RecordFlags::CLEAR));
		let created = ContentEvent::Created {
			head: head(4, "/Root/Docs/(apps)/This/Browse", "Application"),
		};
		assert!(resolver.handle_event(&created));
		assert!(resolver.resolve_one(&docs, Some("browse"), &[]).is_none());

		store.remove(4);
		let destroyed = ContentEvent::Destroyed {
			head: head(4, "/Root/Docs/(apps)/This/Browse", "Application"),
		};
		assert!(resolver.handle_event(&destroyed));
		assert!(resolver.resolve_one(&docs, Some("browse"), &[]).is_some());
		assert_eq!(resolver.manager().build_count(), 3);
	}

	#[test]
	fn loopback_peers_share_invalidations() {
		let cluster = LoopbackCluster::new();
		let store = store();
		let node = || {
			ApplicationResolver::builder(
				Arc::clone(&store) as Arc<dyn ApplicationStore>,
				Arc::new(StaticTypes::standard()),
				Grants::allow_all(),
			)
			.loopback(Arc::clone(&cluster))
			.build()
		};
		let a = node();
		let b = node();
		assert_eq!(cluster.listener_count(), 2);

		assert!(!a.exists("edit"));
		assert!(!b.exists("edit"));
		store.push(app(5, "/Root/(apps)/Folder/Edit"));
		a.invalidate();

		assert!(a.exists("edit"));
		assert!(b.exists("edit"));

		drop(b);
		assert_eq!(cluster.listener_count(), 1);
	}
}
